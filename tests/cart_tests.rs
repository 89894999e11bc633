use nosta_quote::{
    models::{
        cart::Cart,
        configuration::{ConfigField, Configuration},
        cost_table::CostTable,
        line_item::QuoteLineItem,
    },
    pricing::{PriceEngine, PricingStrategy},
    utils::price::round_currency,
};

fn new_cart() -> Cart {
    Cart::new(PriceEngine::offline(CostTable::builtin(), PricingStrategy::PerUnit))
}

fn part(material: &str, dims: (f64, f64, f64), quantity: u32) -> Configuration {
    Configuration {
        product_group: "Passfeder (Keyway)".into(),
        material: material.into(),
        width: dims.0,
        height: dims.1,
        depth: dims.2,
        quantity,
        ..Default::default()
    }
}

fn sum_of_lines(cart: &Cart) -> f64 {
    cart.items().iter().map(|item| item.line_total).sum()
}

#[tokio::test]
async fn grand_total_tracks_every_mutation() {
    let mut cart = new_cart();
    assert_eq!(cart.grand_total(), 0.0);

    let (a, _) = cart.add_item(part("C45", (6.0, 4.0, 10.0), 400)).await;
    let (b, _) = cart.add_item(part("Edelstahl", (8.0, 7.0, 20.0), 10)).await;
    let (c, _) = cart.add_item(part("Aluminium", (5.0, 5.0, 12.0), 3)).await;
    assert_eq!(cart.grand_total(), sum_of_lines(&cart));

    cart.edit_item(b, ConfigField::Quantity, "25").await.unwrap();
    assert_eq!(cart.grand_total(), sum_of_lines(&cart));

    cart.edit_item(c, ConfigField::Coating, "Typ 3").await.unwrap();
    assert_eq!(cart.grand_total(), sum_of_lines(&cart));

    assert!(cart.remove_item(a).is_some());
    assert!(cart.remove_item(a).is_none());
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.grand_total(), sum_of_lines(&cart));
    assert_eq!(cart.items()[0].id, b);
}

#[tokio::test]
async fn line_total_is_unit_price_times_quantity() {
    let mut cart = new_cart();
    cart.add_item(part("Messing", (16.0, 10.0, 30.0), 7)).await;
    let item = &cart.items()[0];
    assert_eq!(item.line_total, item.unit_price * 7.0);
    assert_eq!(item.unit_price, round_currency(item.unit_price));
}

#[tokio::test]
async fn edit_matches_fresh_pricing() {
    let mut cart = new_cart();
    let (id, _) = cart.add_item(part("C45", (6.0, 4.0, 10.0), 1)).await;
    cart.edit_item_by_key(id, "material", "Aluminium").await.unwrap();
    cart.edit_item_by_key(id, "tiefe", "12").await.unwrap();

    let mut fresh = new_cart();
    fresh.add_item(part("Aluminium", (6.0, 4.0, 12.0), 1)).await;

    let edited = cart.get(id).unwrap();
    let expected = &fresh.items()[0];
    assert_eq!(edited.weight, expected.weight);
    assert_eq!(edited.unit_price, expected.unit_price);
    assert_eq!(edited.line_total, expected.line_total);
}

#[tokio::test]
async fn line_items_serialize_flat() {
    let mut cart = new_cart();
    cart.add_item(part("C45", (6.0, 4.0, 10.0), 400)).await;
    let json = serde_json::to_value(&cart.items()[0]).unwrap();

    assert_eq!(json["productGroup"], "Passfeder (Keyway)");
    assert_eq!(json["breite"], 6.0);
    assert_eq!(json["unitPrice"], 2.83);
    assert_eq!(json["lineTotal"], 1132.0);

    let back: QuoteLineItem = serde_json::from_value(json).unwrap();
    assert_eq!(&back, &cart.items()[0]);
}

#[tokio::test]
async fn grand_total_response_is_rounded() {
    let mut cart = new_cart();
    cart.add_item(part("C45", (6.0, 4.0, 10.0), 3)).await;
    cart.add_item(part("C45", (6.0, 4.0, 12.0), 3)).await;
    // 3 × 2.83 + 3 × 3.39
    assert_eq!(cart.grand_total_response().grand_total, 18.66);
}
