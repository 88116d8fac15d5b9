use proptest::prelude::*;
use rca_core::{ConfigAdapter, Node, Profile, RenderRequest, SettingsMap, TargetVersion};

fn origins() -> impl Strategy<Value = Node> {
    proptest::collection::vec(
        prop_oneof![
            "[a-z]{1,8}".prop_map(|host| format!("https://{host}.example.com")),
            Just("*".to_string()),
        ],
        0..4,
    )
    .prop_map(Node::strings)
}

/// Settings every version accepts
fn portable_settings() -> impl Strategy<Value = SettingsMap> {
    (
        origins(),
        any::<bool>(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0..500_i64),
        proptest::option::of(0..10_000_i64),
        proptest::option::of("[a-z]{1,6}"),
        proptest::option::of(proptest::collection::vec("[a-z]{1,6}", 0..2)),
    )
        .prop_map(|(origins, credentials, introspection, depth, capacity, service, issuers)| {
            let mut settings = SettingsMap::new();
            settings.insert("cors.origins".to_string(), origins);
            settings.insert("cors.allow_credentials".to_string(), credentials.into());
            if let Some(flag) = introspection {
                settings.insert("supergraph.introspection".to_string(), flag.into());
            }
            if let Some(depth) = depth {
                settings.insert("limits.max_depth".to_string(), depth.into());
            }
            if let Some(capacity) = capacity {
                settings.insert("rate_limit.capacity".to_string(), capacity.into());
            }
            if let Some(service) = service {
                settings.insert("telemetry.service_name".to_string(), service.into());
            }
            if let Some(issuers) = issuers {
                settings.insert("jwt.issuers".to_string(), Node::strings(issuers));
            }
            settings
        })
}

fn profile() -> impl Strategy<Value = Profile> {
    prop_oneof![Just(Profile::Production), Just(Profile::Development)]
}

fn request(version: TargetVersion, profile: Profile, settings: SettingsMap) -> RenderRequest {
    RenderRequest::builder(version)
        .profile(profile)
        .settings(settings)
        .build()
}

proptest! {
    #[test]
    fn prop_v1_never_has_policies(settings in portable_settings(), profile in profile()) {
        let result = ConfigAdapter::new()
            .render(&request(TargetVersion::V1, profile, settings))
            .unwrap();
        prop_assert!(result.document().get_str("cors.policies").is_none());
        prop_assert!(result.document().get_str("cors.origins").is_some());
    }

    #[test]
    fn prop_v2_never_has_flat_origins(settings in portable_settings(), profile in profile()) {
        let result = ConfigAdapter::new()
            .render(&request(TargetVersion::V2, profile, settings))
            .unwrap();
        prop_assert!(result.document().get_str("cors.origins").is_none());
        prop_assert!(result.document().get_str("cors.policies[0].origins").is_some());
    }

    #[test]
    fn prop_render_extract_render_is_identical(
        settings in portable_settings(),
        profile in profile(),
        v2 in any::<bool>(),
    ) {
        let version = if v2 { TargetVersion::V2 } else { TargetVersion::V1 };
        let adapter = ConfigAdapter::new();
        let first = adapter.render(&request(version, profile, settings)).unwrap();
        let again = adapter
            .render(&request(version, profile, first.to_settings_map().unwrap()))
            .unwrap();

        prop_assert_eq!(first.document(), again.document());
        prop_assert_eq!(first.to_yaml().unwrap(), again.to_yaml().unwrap());
        prop_assert_eq!(first.warnings(), again.warnings());
    }

    #[test]
    fn prop_render_is_deterministic(settings in portable_settings(), profile in profile()) {
        let adapter = ConfigAdapter::new();
        for version in TargetVersion::ALL {
            let a = adapter.render(&request(version, profile, settings.clone())).unwrap();
            let b = adapter.render(&request(version, profile, settings.clone())).unwrap();
            prop_assert_eq!(a.to_yaml().unwrap(), b.to_yaml().unwrap());
            prop_assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
            prop_assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        }
    }

    #[test]
    fn prop_development_never_warns_about_production(settings in portable_settings()) {
        let result = ConfigAdapter::new()
            .render(&request(TargetVersion::V2, Profile::Development, settings))
            .unwrap();
        prop_assert!(result.warnings().is_empty());
    }
}
