//! Minimal host binary demonstrating `power_supervisor` wiring against an
//! in-memory mock device. Not part of the library's public API — shows
//! the shape a real host application's `main` would take: construct the
//! supervisor, wire the ten adapters, `init()`, then drive it with a
//! couple of client calls while the button/lifecycle tasks run in the
//! background.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use power_supervisor::config::SupervisorTimings;
use power_supervisor::supervisor::PowerManagement;
use power_supervisor::{EventKind, IdleAction};

fn main() {
    env_logger::init();

    let button_pressed = Arc::new(AtomicBool::new(true));
    let charger_connected = Arc::new(AtomicBool::new(false));

    let mut pm = PowerManagement::new(SupervisorTimings::default());

    pm.set_setup(|| log::info!("device: setup"));
    pm.set_sleep(|| log::info!("device: entering sleep"));
    pm.set_reboot(|| log::info!("device: rebooting"));
    pm.set_shutdown(|| log::info!("device: shutting down"));
    pm.set_off_charger_setup(|| log::info!("device: off-charger setup"));
    pm.set_off_charger_loop(|| log::info!("device: off-charger loop tick"));
    pm.set_pmic_loop(|| {});

    {
        let button_pressed = Arc::clone(&button_pressed);
        pm.set_button_read(move || button_pressed.load(Ordering::Acquire));
    }
    {
        let charger_connected = Arc::clone(&charger_connected);
        pm.set_charger_connected(move || charger_connected.load(Ordering::Acquire));
    }
    pm.set_device_woken_up(|| false);

    let handle = pm.init().expect("all adapters set");

    handle
        .register_event_handler(EventKind::Any, |kind, _| {
            log::info!("event: {kind:?}");
        })
        .expect("event bus registry available");

    handle.idle_set_expired_action(IdleAction::Sleep);
    handle.idle_set_timeout(30_000);

    std::thread::sleep(Duration::from_secs(5));
    log::info!("current state: {}", handle.state());
}
