//! Tests for the humble-logistics binary.

#[cfg(test)]
mod config_tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::config::LogisticsConfig;

    #[test]
    fn defaults() {
        let c = LogisticsConfig::default();
        assert_eq!(c.database.path(), PathBuf::from("./humble_logistics.sqlite"));
        assert_eq!(c.clock.scale, 1.0);
        assert!(c.clock.start_unix_secs.is_none());
        assert!(c.journal.dir.is_none());

        let s = c.scheduler.to_scheduler_config().unwrap();
        assert_eq!(s.max_sleep, Duration::from_secs(5));
        assert!(s.retry_stranded);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(LogisticsConfig::from_toml_str("").unwrap(), LogisticsConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let c = LogisticsConfig::from_toml_str(
            r#"
            [database]
            name = "test.sqlite"

            [clock]
            scale = 60.0

            [journal]
            dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(c.database.path(), PathBuf::from("./test.sqlite"));
        assert_eq!(c.clock.scale, 60.0);
        assert_eq!(c.journal.dir, Some(PathBuf::from("out")));
        assert_eq!(c.scheduler, LogisticsConfig::default().scheduler);
    }

    #[test]
    fn non_positive_max_sleep_rejected() {
        for bad in ["0.0", "-1.0", "nan"] {
            let text = format!("[scheduler]\nmax_sleep_secs = {bad}");
            assert!(LogisticsConfig::from_toml_str(&text).is_err(), "{bad}");
        }
        let mut c = LogisticsConfig::default();
        c.scheduler.max_sleep_secs = 0.0;
        assert!(c.scheduler.to_scheduler_config().is_err());
    }

    #[test]
    fn non_finite_clock_values_rejected() {
        for bad in ["scale = nan", "scale = inf", "scale = -inf", "start_unix_secs = nan"] {
            let text = format!("[clock]\n{bad}");
            assert!(LogisticsConfig::from_toml_str(&text).is_err(), "{bad}");
        }
        assert!(LogisticsConfig::from_toml_str("[clock]\nscale = -2.0").is_ok());

        // Command-line overrides go through the same check.
        let mut c = LogisticsConfig::default();
        c.clock.scale = f64::INFINITY;
        assert!(c.validate().is_err());
        c.clock.scale = 0.0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(LogisticsConfig::from_toml_str("[clock]\nscale = \"fast\"").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hl.toml");
        let mut c = LogisticsConfig::default();
        c.clock.start_unix_secs = Some(1_700_000_000.0);
        c.scheduler.retry_stranded = false;
        c.save(&path).unwrap();

        assert_eq!(LogisticsConfig::load(&path).unwrap(), c);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = LogisticsConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c, LogisticsConfig::default());
    }
}

#[cfg(test)]
mod parse_tests {
    use std::time::Duration;

    use hl_core::{CoreError, Manifest, ProductId, TransportId, WarehouseId};

    use crate::admin::{AdminCommand, AdminError, parse_duration};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("90").unwrap(), secs(90));
        assert_eq!(parse_duration("1.5").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("90m").unwrap(), secs(5400));
        assert_eq!(parse_duration("2h30m").unwrap(), secs(9000));
        assert_eq!(parse_duration("1w2d3h4m5s").unwrap(), secs(788_645));
        assert_eq!(parse_duration("3D").unwrap(), secs(3 * 86_400));
    }

    #[test]
    fn bad_durations() {
        for bad in ["", "m", "5x", "5m3", "-3", "h5", "99999999999999999999w", "inf"] {
            assert!(matches!(parse_duration(bad), Err(AdminError::BadDuration(_))), "{bad}");
        }
    }

    #[test]
    fn connect_rounds_up_to_minutes() {
        let cmd: AdminCommand = "connect 1 2 61s two-way".parse().unwrap();
        assert_eq!(cmd, AdminCommand::Connect {
            from:    WarehouseId(1),
            to:      WarehouseId(2),
            minutes: 2,
            two_way: true,
        });
        let cmd: AdminCommand = "connect 1 2 1h".parse().unwrap();
        assert!(matches!(cmd, AdminCommand::Connect { minutes: 60, two_way: false, .. }));
        assert!(matches!(
            "connect 1 2 5m both".parse::<AdminCommand>(),
            Err(AdminError::Usage(_))
        ));
    }

    #[test]
    fn dispatch_collects_manifest() {
        let cmd: AdminCommand = "dispatch 1 4 3:10 5:2 3:1".parse().unwrap();
        assert_eq!(cmd, AdminCommand::Dispatch {
            from:  WarehouseId(1),
            to:    WarehouseId(4),
            cargo: Manifest::new().with(ProductId(3), 11).with(ProductId(5), 2),
        });
        assert!(matches!("dispatch 1 4 3:0".parse::<AdminCommand>(), Err(AdminError::Core(_))));
        assert!(matches!("dispatch 1 4".parse::<AdminCommand>(), Err(AdminError::Usage(_))));
        assert!(matches!(
            "add-stock 1 5:18446744073709551615 5:1".parse::<AdminCommand>(),
            Err(AdminError::Core(CoreError::CountOverflow(ProductId(5))))
        ));
    }

    #[test]
    fn names_keep_spaces() {
        let cmd: AdminCommand = "warehouse North  Dock".parse().unwrap();
        assert_eq!(cmd, AdminCommand::Warehouse("North Dock".into()));
    }

    #[test]
    fn misc_commands() {
        assert_eq!("TIME".parse::<AdminCommand>().unwrap(), AdminCommand::Time);
        assert_eq!("scale 0".parse::<AdminCommand>().unwrap(), AdminCommand::Scale(0.0));
        assert_eq!("reroute 7 2".parse::<AdminCommand>().unwrap(), AdminCommand::Reroute {
            transport: TransportId(7),
            target:    WarehouseId(2),
        });
        assert!(matches!("scale NaN".parse::<AdminCommand>(), Err(AdminError::BadNumber(_))));
        assert!(matches!("stock x".parse::<AdminCommand>(), Err(AdminError::BadNumber(_))));
        assert!(matches!("quit now".parse::<AdminCommand>(), Err(AdminError::Usage(_))));
        assert!(matches!("fly 1 2".parse::<AdminCommand>(), Err(AdminError::UnknownCommand(_))));
    }
}

#[cfg(test)]
mod console_tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use hl_core::{ManualSource, VirtualClock, WarehouseId};
    use hl_store::{AdminStore, LogisticsStore, MemoryStore};

    use crate::admin::{Admin, admin_loop};

    fn admin() -> (Admin<MemoryStore, Arc<ManualSource>>, Arc<VirtualClock<Arc<ManualSource>>>) {
        let clock = Arc::new(VirtualClock::with_source(Arc::new(ManualSource::new()), 0.0));
        (Admin::new(MemoryStore::new(), Arc::clone(&clock)), clock)
    }

    fn session(admin: &mut Admin<MemoryStore, Arc<ManualSource>>, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        admin_loop(admin, Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_owned).collect()
    }

    #[test]
    fn seeds_network_and_dispatches() {
        let (mut a, _) = admin();
        let out = session(
            &mut a,
            "warehouse A\n\
             warehouse B\n\
             product bolt\n\
             connect 1 2 90s\n\
             add-stock 1 3:40\n\
             dispatch 1 2 3:5\n\
             status\n",
        );
        assert_eq!(out.len(), 7, "{out:?}");
        assert!(out[3].contains("(2 min)"), "{}", out[3]);
        assert_eq!(out[4], "added 40 units to WarehouseId(1)");
        assert!(out[5].contains("departed via ConnectionId(4) toward WarehouseId(2)"), "{}", out[5]);
        assert_eq!(out[6], "1 in transit, 0 stranded, 0 delivered");

        let store = a.store_mut();
        assert_eq!(store.list_active_transports().unwrap().len(), 1);
        // Dispatch leaves the source stock alone.
        assert_eq!(store.stock(WarehouseId(1)).unwrap().total_units(), 40);
    }

    #[test]
    fn dispatch_without_path_is_stranded() {
        let (mut a, _) = admin();
        let out = session(&mut a, "warehouse A\nwarehouse B\nproduct bolt\ndispatch 1 2 3:1\nstatus\n");
        assert!(out[3].contains("no path yet"), "{}", out[3]);
        assert_eq!(out[4], "0 in transit, 1 stranded, 0 delivered");
    }

    #[test]
    fn clock_commands() {
        let (mut a, clock) = admin();
        let out = session(&mut a, "jump 1d2m\ntime\nscale 60\nscale 0\n");
        assert_eq!(clock.current_minute().0, 24 * 60 + 2);
        assert!(out[1].starts_with("virtual time 86520.0s"), "{}", out[1]);
        assert_eq!(out[2], "scale 1 -> 60");
        assert_eq!(out[3], "scale 60 -> 0 (clock paused)");
        assert_eq!(clock.get_scale(), 0.0);
    }

    #[test]
    fn errors_do_not_stop_the_console() {
        let (mut a, _) = admin();
        let out = session(&mut a, "bogus\n\ndisconnect 99\nwarehouse A\nquit\nwarehouse B\n");
        assert_eq!(out.len(), 3, "{out:?}");
        assert!(out[0].starts_with("error: unknown command"));
        assert!(out[1].starts_with("error:"));
        assert!(out[2].starts_with("added WarehouseId(1)"));
        // Nothing after `quit` ran.
        assert_eq!(a.store_mut().add_warehouse("C").unwrap(), WarehouseId(2));
    }
}
