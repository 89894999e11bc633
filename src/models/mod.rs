pub mod cart;
pub mod configuration;
pub mod cost_table;
pub mod document;
pub mod line_item;
pub mod material;
pub mod option_set;
pub mod price_breakdown;
pub mod product_family;
pub mod saved_quote;
