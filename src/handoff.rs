//! What a launch does once it knows whether it is the primary instance.
//!
//! A secondary launch signals the running window and then writes the notif
//! slot; it never talks to the page itself. A primary launch that carries a
//! clicked identifier posts it to its own notif slot, so in every case the
//! primary's poller is the one that delivers.
use crate::config::AppConfig;
use crate::launch::LaunchArgs;
use crate::relay::NotificationRelay;

/// Wakes an already running primary window
pub trait WindowSignal {
    /// True when a window was found and signalled
    fn signal(&self, title: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchPlan {
    /// Signal the primary, relay the click, exit
    HandOff {
        notification: Option<String>,
        /// Treat an outstanding displayed toast as clicked
        forward_pending: bool,
    },
    /// Become the window
    Run {
        from_startup: bool,
        notification: Option<String>,
        consult_pending: bool,
    },
}

/// Whether this launch needs to know about a running instance at all
pub fn should_probe_lock(args: &LaunchArgs, config: &AppConfig) -> bool {
    config.single_instance || args.requests_handoff()
}

pub fn plan_launch(args: &LaunchArgs, config: &AppConfig, primary: bool) -> LaunchPlan {
    if !primary && args.requests_handoff() {
        return LaunchPlan::HandOff {
            notification: args.notification.clone(),
            forward_pending: false,
        };
    }

    if !primary && config.single_instance {
        return LaunchPlan::HandOff {
            notification: None,
            forward_pending: config.enable_notification,
        };
    }

    LaunchPlan::Run {
        from_startup: args.from_startup,
        notification: args.notification.clone(),
        consult_pending: config.enable_notification
            && !args.from_startup
            && args.notification.is_none(),
    }
}

impl LaunchPlan {
    pub fn is_handoff(&self) -> bool {
        matches!(self, LaunchPlan::HandOff { .. })
    }

    /// Primary side: queue whatever click this launch stands for on our own
    /// notif slot. Returns the queued identifier.
    pub fn seed_relay(&self, relay: &NotificationRelay) -> Option<String> {
        match self {
            LaunchPlan::Run {
                notification: Some(id),
                ..
            } => {
                tracing::info!("Launched for notification {}", id);
                relay.post_click(id);
                Some(id.clone())
            }
            LaunchPlan::Run {
                consult_pending: true,
                ..
            } => {
                let forwarded = relay.forward_pending();
                if let Some(id) = &forwarded {
                    tracing::info!("Picked up pending notification {} from a previous run", id);
                }
                forwarded
            }
            _ => None,
        }
    }
}

/// Secondary side. Signal first, then write the slot the primary's poller
/// drains. Returns whether a running window was found.
pub fn hand_off<S: WindowSignal>(
    plan: &LaunchPlan,
    relay: &NotificationRelay,
    signaller: &S,
    title: &str,
) -> bool {
    let LaunchPlan::HandOff {
        notification,
        forward_pending,
    } = plan
    else {
        return false;
    };

    let found = signaller.signal(title);
    if found {
        tracing::info!("Signalled running instance \"{}\"", title);
    } else {
        tracing::debug!("No running window titled \"{}\"", title);
    }

    match notification {
        Some(id) => relay.post_click(id),
        None if *forward_pending => {
            relay.forward_pending();
        }
        None => {}
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AppIdentity;
    use crate::relay::Slot;
    use std::cell::RefCell;
    use std::path::Path;

    struct FakeSignal {
        found: bool,
        relay: NotificationRelay,
        /// Whether the notif slot already existed when we were signalled
        slot_seen: RefCell<Vec<bool>>,
    }

    impl WindowSignal for FakeSignal {
        fn signal(&self, _title: &str) -> bool {
            self.slot_seen
                .borrow_mut()
                .push(self.relay.path(Slot::Notif).exists());
            self.found
        }
    }

    fn relay_in(dir: &Path) -> NotificationRelay {
        NotificationRelay::in_dir(dir, &AppIdentity::from_title("Handoff Test"))
    }

    fn config(single_instance: bool, enable_notification: bool) -> AppConfig {
        AppConfig {
            url: "https://example.com".to_string(),
            single_instance,
            enable_notification,
            ..Default::default()
        }
    }

    #[test]
    fn test_probe_only_when_needed() {
        let plain = LaunchArgs::default();
        let show = LaunchArgs::parse(["--show"]);
        assert!(!should_probe_lock(&plain, &config(false, true)));
        assert!(should_probe_lock(&plain, &config(true, false)));
        assert!(should_probe_lock(&show, &config(false, false)));
    }

    #[test]
    fn test_secondary_with_notification_hands_off() {
        let args = LaunchArgs::parse(["--notif-id=7"]);
        assert_eq!(
            plan_launch(&args, &config(false, true), false),
            LaunchPlan::HandOff {
                notification: Some("7".to_string()),
                forward_pending: false,
            }
        );
    }

    #[test]
    fn test_plain_secondary_forwards_pending_only_with_notifications() {
        let args = LaunchArgs::default();
        assert_eq!(
            plan_launch(&args, &config(true, true), false),
            LaunchPlan::HandOff {
                notification: None,
                forward_pending: true,
            }
        );
        assert_eq!(
            plan_launch(&args, &config(true, false), false),
            LaunchPlan::HandOff {
                notification: None,
                forward_pending: false,
            }
        );
    }

    #[test]
    fn test_secondary_without_single_instance_runs() {
        let plan = plan_launch(&LaunchArgs::default(), &config(false, true), false);
        assert!(!plan.is_handoff());
    }

    #[test]
    fn test_primary_consults_pending_unless_startup_or_explicit() {
        let cfg = config(true, true);
        let plan = plan_launch(&LaunchArgs::default(), &cfg, true);
        assert_eq!(
            plan,
            LaunchPlan::Run {
                from_startup: false,
                notification: None,
                consult_pending: true,
            }
        );

        let plan = plan_launch(&LaunchArgs::parse(["--startup"]), &cfg, true);
        assert!(matches!(plan, LaunchPlan::Run { consult_pending: false, from_startup: true, .. }));

        let plan = plan_launch(&LaunchArgs::parse(["--notif-id=3"]), &cfg, true);
        assert!(matches!(plan, LaunchPlan::Run { consult_pending: false, .. }));
    }

    #[test]
    fn test_hand_off_signals_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let signaller = FakeSignal {
            found: true,
            relay: relay_in(dir.path()),
            slot_seen: RefCell::new(Vec::new()),
        };
        let relay = relay_in(dir.path());
        let plan = LaunchPlan::HandOff {
            notification: Some("42".to_string()),
            forward_pending: false,
        };

        assert!(hand_off(&plan, &relay, &signaller, "Handoff Test"));
        assert_eq!(*signaller.slot_seen.borrow(), vec![false]);
        assert_eq!(relay.take_click().as_deref(), Some("42"));
    }

    #[test]
    fn test_hand_off_writes_even_when_window_missing() {
        let dir = tempfile::tempdir().unwrap();
        let signaller = FakeSignal {
            found: false,
            relay: relay_in(dir.path()),
            slot_seen: RefCell::new(Vec::new()),
        };
        let relay = relay_in(dir.path());
        relay.record_displayed("9");

        let plan = LaunchPlan::HandOff {
            notification: None,
            forward_pending: true,
        };
        assert!(!hand_off(&plan, &relay, &signaller, "Handoff Test"));
        assert_eq!(relay.take_click().as_deref(), Some("9"));
        assert_eq!(relay.take_pending(), None);
    }

    #[test]
    fn test_seed_relay() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path());

        let explicit = LaunchPlan::Run {
            from_startup: false,
            notification: Some("5".to_string()),
            consult_pending: false,
        };
        assert_eq!(explicit.seed_relay(&relay).as_deref(), Some("5"));
        assert_eq!(relay.take_click().as_deref(), Some("5"));

        relay.record_displayed("6");
        let startup = LaunchPlan::Run {
            from_startup: true,
            notification: None,
            consult_pending: false,
        };
        assert_eq!(startup.seed_relay(&relay), None);
        assert!(relay.path(Slot::Pending).exists());

        let plain = LaunchPlan::Run {
            from_startup: false,
            notification: None,
            consult_pending: true,
        };
        assert_eq!(plain.seed_relay(&relay).as_deref(), Some("6"));
        assert_eq!(relay.take_click().as_deref(), Some("6"));
    }

    #[test]
    fn test_delivered_click_is_not_replayed_on_next_launch() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path());

        relay.record_displayed("42");
        relay.post_click("42");
        assert_eq!(relay.take_click().as_deref(), Some("42"));

        let plan = plan_launch(&LaunchArgs::default(), &config(true, true), true);
        assert_eq!(plan.seed_relay(&relay), None);
        assert_eq!(relay.take_click(), None);
    }

    #[test]
    fn test_notification_relaunch_settles_pending() {
        let dir = tempfile::tempdir().unwrap();
        let relay = relay_in(dir.path());
        relay.record_displayed("7");

        let relaunch = plan_launch(&LaunchArgs::parse(["--notif-id=7"]), &config(true, true), true);
        assert_eq!(relaunch.seed_relay(&relay).as_deref(), Some("7"));
        assert_eq!(relay.take_click().as_deref(), Some("7"));

        let plain = plan_launch(&LaunchArgs::default(), &config(true, true), true);
        assert_eq!(plain.seed_relay(&relay), None);
    }
}
