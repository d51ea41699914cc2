#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_trace_params_default() {
        let params = TraceParams::default();
        assert_eq!(params.turn_policy, TurnPolicy::Minority);
        assert_eq!(params.turd_size, 2);
        assert_eq!(params.alpha_max, 1.0);
        assert!(params.opt_curve);
        assert_eq!(params.opt_tolerance, 0.2);
        assert_eq!(params.threshold, Threshold::Auto);
        assert!(params.black_on_white);
        assert_eq!(params.fill_color(), "black");
        assert_eq!(params.background, COLOR_TRANSPARENT);
    }

    #[test]
    fn test_auto_fill_follows_polarity() {
        let mut params = TraceParams::default();
        params.black_on_white = false;
        assert_eq!(params.fill_color(), "white");
        params.color = "red".to_string();
        assert_eq!(params.fill_color(), "red");
    }

    #[test]
    fn test_turn_policy_parsing() {
        for policy in TurnPolicy::ALL {
            assert_eq!(policy.name().parse::<TurnPolicy>().unwrap(), policy);
        }
        let err = "diagonal".parse::<TurnPolicy>().unwrap_err();
        assert!(matches!(err, TraceError::InvalidParameter(_)));
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!("auto".parse::<Threshold>().unwrap(), Threshold::Auto);
        assert_eq!("128".parse::<Threshold>().unwrap(), Threshold::Level(128));
        assert_eq!("0".parse::<Threshold>().unwrap(), Threshold::Level(0));
        assert!(matches!("256".parse::<Threshold>(), Err(TraceError::InvalidParameter(_))));
        assert!(matches!("-1".parse::<Threshold>(), Err(TraceError::InvalidParameter(_))));
        assert!(matches!(Threshold::try_from(300), Err(TraceError::InvalidParameter(_))));
    }

    #[test]
    fn test_steps_parsing() {
        assert_eq!("auto".parse::<Steps>().unwrap(), Steps::Auto);
        assert_eq!("4".parse::<Steps>().unwrap(), Steps::Count(4));
        assert_eq!(
            "20, 60,80".parse::<Steps>().unwrap(),
            Steps::Thresholds(vec![20, 60, 80])
        );
        assert!(matches!("0".parse::<Steps>(), Err(TraceError::InvalidParameter(_))));
        assert!(matches!("300".parse::<Steps>(), Err(TraceError::InvalidParameter(_))));
        assert!(matches!("many".parse::<Steps>(), Err(TraceError::InvalidParameter(_))));
    }

    #[test]
    fn test_deserialize_from_json() {
        let params: TraceParams = serde_json::from_str(
            r#"{"turn_policy": "majority", "threshold": 100, "opt_curve": false}"#,
        )
        .unwrap();
        assert_eq!(params.turn_policy, TurnPolicy::Majority);
        assert_eq!(params.threshold, Threshold::Level(100));
        assert!(!params.opt_curve);
        assert_eq!(params.turd_size, 2);

        let auto: TraceParams = serde_json::from_str(r#"{"threshold": "auto"}"#).unwrap();
        assert_eq!(auto.threshold, Threshold::Auto);

        assert!(serde_json::from_str::<TraceParams>(r#"{"threshold": 999}"#).is_err());

        let posterize: PosterizeParams =
            serde_json::from_str(r#"{"steps": [200, 100], "fill_strategy": "mean"}"#).unwrap();
        assert_eq!(posterize.steps, Steps::Thresholds(vec![200, 100]));
        assert_eq!(posterize.fill_strategy, FillStrategy::Mean);
        assert_eq!(posterize.range_distribution, RangeDistribution::Auto);

        let counted: PosterizeParams = serde_json::from_str(r#"{"steps": 3}"#).unwrap();
        assert_eq!(counted.steps, Steps::Count(3));
    }

    #[test]
    fn test_update_validation_and_geometry_flag() {
        let cosmetic = ParamsUpdate {
            color: Some("red".to_string()),
            background: Some("#222".to_string()),
            ..Default::default()
        };
        assert!(!cosmetic.affects_geometry());
        assert!(cosmetic.validate().is_ok());

        let geometric = ParamsUpdate {
            threshold: Some(Threshold::Level(10)),
            ..Default::default()
        };
        assert!(geometric.affects_geometry());

        let bad = ParamsUpdate {
            alpha_max: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(TraceError::InvalidParameter(_))));

        let bad_steps = PosterizeUpdate {
            steps: Some(Steps::Count(0)),
            ..Default::default()
        };
        assert!(bad_steps.validate().is_err());
    }

    #[test]
    fn test_apply_update() {
        let mut params = TraceParams::default();
        params.apply(&ParamsUpdate {
            turd_size: Some(0),
            black_on_white: Some(false),
            ..Default::default()
        });
        assert_eq!(params.turd_size, 0);
        assert!(!params.black_on_white);
        assert_eq!(params.alpha_max, 1.0);
    }
}
