pub mod currency;
pub mod http;
pub mod lenient;
pub mod price;
pub mod unit;
