use nosta_quote::{
    models::{configuration::Configuration, cost_table::CostTable},
    pricing::{
        PriceEngine, PricingStrategy,
        weight::{calculate_material_weight, calculate_weight},
    },
    utils::price::volume_discount_rate,
};

fn engine(strategy: PricingStrategy) -> PriceEngine {
    PriceEngine::offline(CostTable::builtin(), strategy)
}

fn steel_key() -> Configuration {
    Configuration {
        product_group: "Passfeder (Keyway)".into(),
        din_norm: "DIN 6885".into(),
        material: "C45".into(),
        width: 6.0,
        height: 4.0,
        depth: 10.0,
        quantity: 400,
        ..Default::default()
    }
}

#[test]
fn any_zero_dimension_weighs_nothing() {
    let table = CostTable::builtin();
    for (w, h, d) in [(0.0, 4.0, 10.0), (6.0, 0.0, 10.0), (6.0, 4.0, 0.0), (-6.0, 4.0, 10.0)] {
        assert_eq!(calculate_material_weight(w, h, d, "C45", &table), 0.0);
    }
    assert_eq!(calculate_weight(6.0, 4.0, f64::NAN, 7.85), 0.0);
}

#[test]
fn weight_uses_base_material_density() {
    let table = CostTable::builtin();
    assert_eq!(calculate_material_weight(60.0, 40.0, 100.0, "C45", &table), 1884.0);
    assert_eq!(
        calculate_material_weight(6.0, 4.0, 10.0, "C45K-variant", &table),
        calculate_material_weight(6.0, 4.0, 10.0, "C45", &table)
    );
}

#[tokio::test]
async fn end_to_end_steel_key() {
    let breakdown = engine(PricingStrategy::PerUnit).quote(&steel_key()).await;
    assert_eq!(breakdown.weight, 1.884);
    assert_eq!(breakdown.unit_price, 2.83);
    assert_eq!(breakdown.line_total, 1132.0);
    assert!(breakdown.warnings.is_empty());
}

#[tokio::test]
async fn material_only_ignores_selected_treatments() {
    let mut config = steel_key();
    config.bore = "M4".into();
    config.hardening = "HRC 50".into();

    let unit = engine(PricingStrategy::PerUnitMaterialOnly).unit_price(&config).await;
    assert_eq!(unit, 2.83);
}

#[tokio::test]
async fn each_selected_axis_adds_its_cost() {
    let engine = engine(PricingStrategy::PerUnit);
    let base = engine.unit_price(&steel_key()).await;

    // M4 = 13, Typ 5 = 4, HRC 41 = 60, h4 = 1.5, h5 = 1.6
    let cases = [
        ("bore", "M4", 13.0),
        ("coating", "Typ 5", 4.0),
        ("hardening", "HRC 41", 60.0),
        ("toleranceBreite", "h4", 1.5),
        ("toleranceHohe", "h5", 1.6),
    ];
    for (key, value, cost) in cases {
        let mut config = steel_key();
        let applied = config.apply_form_fill([(key, value)]);
        assert_eq!(applied, 1);
        let priced = engine.unit_price(&config).await;
        assert!(
            (priced - base - cost).abs() < 1e-9,
            "{key}={value}: {priced} vs {base} + {cost}"
        );

        let mut unselected = steel_key();
        unselected.apply_form_fill([(key, "none")]);
        assert_eq!(engine.unit_price(&unselected).await, base);
    }
}

#[tokio::test]
async fn bore_cost_scales_with_count() {
    let engine = engine(PricingStrategy::PerUnit);
    let mut config = steel_key();
    config.bore = "M4".into();
    config.number_of_bores = 3;
    // 2.826 + 3 × 13
    assert_eq!(engine.unit_price(&config).await, 41.83);
}

#[tokio::test]
async fn volume_discount_applies_before_rounding() {
    assert_eq!(volume_discount_rate(25), 0.04);

    let mut config = steel_key();
    config.quantity = 25;
    let breakdown = engine(PricingStrategy::PerOrderWithVolumeDiscount)
        .quote(&config)
        .await;
    // 2.826 × 25 = 70.65, less 4% = 67.824
    assert_eq!(breakdown.discount_rate, 0.04);
    assert_eq!(breakdown.line_total, 67.82);
    assert_eq!(breakdown.response().price, 67.82);
}

#[tokio::test]
async fn pricing_is_idempotent() {
    let engine = engine(PricingStrategy::PerOrderWithVolumeDiscount);
    let config = steel_key();
    let first = engine.quote(&config).await;
    let second = engine.quote(&config).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn incomplete_configuration_prices_at_zero_with_warning() {
    let config = Configuration {
        product_group: "Nutenstein (T-Slot Nut)".into(),
        material: "Messing".into(),
        width: 8.0,
        ..Default::default()
    };
    let breakdown = engine(PricingStrategy::PerUnit).quote(&config).await;
    assert_eq!(breakdown.unit_price, 0.0);
    assert!(breakdown.is_degraded());
}
