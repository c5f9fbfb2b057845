use ferric_fd::core::{DiagKey, ExerciseStyle, FdError, OptionType, PricingEngine};
use ferric_fd::engines::pde::ExplicitFdEngine;
use ferric_fd::instruments::VanillaOption;
use ferric_fd::market::Market;

fn normal_cdf(x: f64) -> f64 {
    // Abramowitz-Stegun 7.1.26 on erf, |error| < 1.5e-7.
    let z = x.abs() / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.327_591_1 * z);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    let erf = 1.0 - poly * (-z * z).exp();
    if x >= 0.0 {
        0.5 * (1.0 + erf)
    } else {
        0.5 * (1.0 - erf)
    }
}

fn black_scholes(option_type: OptionType, market: &Market, strike: f64, expiry: f64) -> f64 {
    let (s, r, q, v) = (market.spot, market.rate, market.dividend_yield, market.vol);
    let sqrt_t = expiry.sqrt();
    let d1 = ((s / strike).ln() + (r - q + 0.5 * v * v) * expiry) / (v * sqrt_t);
    let d2 = d1 - v * sqrt_t;
    let df_r = (-r * expiry).exp();
    let df_q = (-q * expiry).exp();
    match option_type {
        OptionType::Call => s * df_q * normal_cdf(d1) - strike * df_r * normal_cdf(d2),
        OptionType::Put => strike * df_r * normal_cdf(-d2) - s * df_q * normal_cdf(-d1),
    }
}

fn market(spot: f64, rate: f64, dividend_yield: f64, vol: f64) -> Market {
    Market::builder()
        .spot(spot)
        .rate(rate)
        .dividend_yield(dividend_yield)
        .flat_vol(vol)
        .build()
        .expect("valid market")
}

#[test]
fn european_prices_match_black_scholes() {
    let engine = ExplicitFdEngine::new(2_000, 120);
    let cases = [
        (market(100.0, 0.05, 0.0, 0.20), 100.0, 1.0),
        (market(100.0, 0.02, 0.03, 0.30), 100.0, 0.5),
        (market(90.0, 0.02, 0.03, 0.30), 100.0, 0.5),
    ];
    for (mkt, strike, expiry) in &cases {
        for option in [
            VanillaOption::european_call(*strike, *expiry),
            VanillaOption::european_put(*strike, *expiry),
        ] {
            let fd = engine.price(&option, mkt).expect("fd price").price;
            let bs = black_scholes(option.option_type, mkt, *strike, *expiry);
            let rel_err = (fd - bs).abs() / bs;
            assert!(
                rel_err < 5.0e-3,
                "{:?} spot={} fd={fd} bs={bs} rel_err={rel_err}",
                option.option_type,
                mkt.spot
            );
        }
    }
}

#[test]
fn early_exercise_premium_orders_exercise_styles() {
    let mkt = market(100.0, 0.06, 0.0, 0.25);
    let engine = ExplicitFdEngine::new(1_400, 90);
    let european = engine
        .price(&VanillaOption::european_put(100.0, 1.0), &mkt)
        .expect("european")
        .price;
    let american = engine
        .price(&VanillaOption::american_put(100.0, 1.0), &mkt)
        .expect("american")
        .price;
    let bermudan_option = VanillaOption {
        option_type: OptionType::Put,
        strike: 100.0,
        expiry: 1.0,
        exercise: ExerciseStyle::Bermudan {
            dates: vec![0.25, 0.5, 0.75, 1.0],
        },
    };
    let bermudan = engine.price(&bermudan_option, &mkt).expect("bermudan");

    assert!(american > bermudan.price + 0.05, "american={american} bermudan={}", bermudan.price);
    assert!(bermudan.price > european + 0.2, "bermudan={} european={european}", bermudan.price);
    assert_eq!(
        bermudan.diagnostics.get_key(DiagKey::NumStoppingTimes),
        Some(4.0)
    );
}

#[test]
fn american_call_without_dividends_matches_european() {
    let mkt = market(100.0, 0.05, 0.0, 0.20);
    let engine = ExplicitFdEngine::new(1_500, 80);
    let european = engine
        .price(&VanillaOption::european_call(100.0, 1.0), &mkt)
        .expect("european")
        .price;
    let american = engine
        .price(&VanillaOption::american_call(100.0, 1.0), &mkt)
        .expect("american")
        .price;
    assert!((american - european).abs() < 1.0e-6);
}

#[test]
fn disabled_cfl_enforcement_still_prices() {
    let mkt = market(100.0, 0.05, 0.0, 0.20);
    let option = VanillaOption::european_call(100.0, 1.0);
    let strict = ExplicitFdEngine::new(40, 120).price(&option, &mkt);
    assert!(matches!(strict, Err(FdError::NumericalError(_))));

    let relaxed = ExplicitFdEngine::new(40, 120)
        .with_enforce_cfl(false)
        .price(&option, &mkt);
    assert!(relaxed.is_ok());
}

#[test]
fn batch_pricing_matches_single_pricing() {
    let mkt = market(100.0, 0.05, 0.0, 0.20);
    let engine = ExplicitFdEngine::new(1_500, 80);
    let options = vec![
        VanillaOption::european_call(90.0, 1.0),
        VanillaOption::european_put(110.0, 0.5),
        VanillaOption::american_put(100.0, 1.0),
        VanillaOption::european_call(-1.0, 1.0),
    ];
    let batch = engine.price_batch(&options, &mkt);
    assert_eq!(batch.len(), options.len());
    for (option, result) in options.iter().zip(&batch) {
        match engine.price(option, &mkt) {
            Ok(single) => assert_eq!(result.as_ref().expect("batch ok").price, single.price),
            Err(err) => assert_eq!(result.as_ref().expect_err("batch err"), &err),
        }
    }
}

#[test]
fn engine_configuration_roundtrips_through_json() {
    let engine = ExplicitFdEngine::new(2_500, 150)
        .with_grid_stretch(0.2)
        .with_cfl_safety_factor(0.8)
        .with_enforce_cfl(false);
    let json = serde_json::to_string(&engine).expect("serialize engine");
    let back: ExplicitFdEngine = serde_json::from_str(&json).expect("deserialize engine");
    assert_eq!(back, engine);

    let option: VanillaOption = serde_json::from_str(
        r#"{"option_type":"Put","strike":95.0,"expiry":0.75,
            "exercise":{"Bermudan":{"dates":[0.25,0.5,0.75]}}}"#,
    )
    .expect("deserialize option");
    assert_eq!(option.option_type, OptionType::Put);
    assert!(option.validate().is_ok());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batch_is_deterministic() {
    let mkt = market(100.0, 0.05, 0.01, 0.25);
    let engine = ExplicitFdEngine::new(1_500, 80);
    let options = (0..16)
        .map(|i| VanillaOption::american_put(80.0 + 2.5 * i as f64, 1.0))
        .collect::<Vec<_>>();
    let first = engine.price_batch(&options, &mkt);
    let second = engine.price_batch(&options, &mkt);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.as_ref().expect("first").price, b.as_ref().expect("second").price);
    }
}
