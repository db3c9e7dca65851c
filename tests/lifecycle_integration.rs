//! End-to-end lifecycle scenarios driven against a recording mock host
//! that records every adapter call and lets each scenario drive the ten
//! callbacks independently.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use power_supervisor::config::SupervisorTimings;
use power_supervisor::supervisor::PowerManagement;
use power_supervisor::{DeviceState, EventKind, IdleAction};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Setup,
    Sleep,
    Reboot,
    Shutdown,
    OffChargerSetup,
    OffChargerLoop,
}

#[derive(Clone)]
struct MockHost {
    calls: Arc<Mutex<Vec<Call>>>,
    button_pressed: Arc<AtomicBool>,
    charger_connected: Arc<AtomicBool>,
    woken_up: Arc<AtomicBool>,
    shutdown_count: Arc<AtomicUsize>,
}

impl MockHost {
    fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            button_pressed: Arc::new(AtomicBool::new(false)),
            charger_connected: Arc::new(AtomicBool::new(false)),
            woken_up: Arc::new(AtomicBool::new(false)),
            shutdown_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn wire(&self, pm: &mut PowerManagement) {
        let calls = Arc::clone(&self.calls);
        pm.set_setup(move || calls.lock().unwrap().push(Call::Setup));

        let calls = Arc::clone(&self.calls);
        pm.set_sleep(move || calls.lock().unwrap().push(Call::Sleep));

        let calls = Arc::clone(&self.calls);
        pm.set_reboot(move || calls.lock().unwrap().push(Call::Reboot));

        let calls = Arc::clone(&self.calls);
        let shutdown_count = Arc::clone(&self.shutdown_count);
        pm.set_shutdown(move || {
            calls.lock().unwrap().push(Call::Shutdown);
            shutdown_count.fetch_add(1, Ordering::SeqCst);
        });

        let calls = Arc::clone(&self.calls);
        pm.set_off_charger_setup(move || calls.lock().unwrap().push(Call::OffChargerSetup));

        let calls = Arc::clone(&self.calls);
        pm.set_off_charger_loop(move || calls.lock().unwrap().push(Call::OffChargerLoop));

        pm.set_pmic_loop(|| {});

        let button_pressed = Arc::clone(&self.button_pressed);
        pm.set_button_read(move || button_pressed.load(Ordering::Acquire));

        let charger_connected = Arc::clone(&self.charger_connected);
        pm.set_charger_connected(move || charger_connected.load(Ordering::Acquire));

        let woken_up = Arc::clone(&self.woken_up);
        pm.set_device_woken_up(move || woken_up.load(Ordering::Acquire));
    }
}

fn fast_timings() -> SupervisorTimings {
    SupervisorTimings {
        debounce_ms: 5,
        long_press_ms: 20,
        very_long_press_ms: 40,
        init_wait_for_button_action_ms: 50,
        idle_timeout_min_ms: 50,
        gap_ms: 20,
        off_charger_poll_ms: 5,
        requests_queue_size: 10,
    }
}

fn wait_until(mut pred: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if pred() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    pred()
}

/// Release the button shortly after `init()` spawns the button task:
/// `INIT`'s raw `button_read()` check sees the press immediately, but
/// the release happens before the classifier's debounce window elapses,
/// so it never even reaches `ButtonState::Pressed` — keeping later
/// assertions free of an incidental long-press escalation.
fn press_briefly_then_release(host: &MockHost) {
    host.button_pressed.store(true, Ordering::Release);
    std::thread::sleep(Duration::from_millis(3));
    host.button_pressed.store(false, Ordering::Release);
}

#[test]
fn cold_boot_with_button_reaches_dev_idle() {
    let host = MockHost::new();
    host.button_pressed.store(true, Ordering::Release);

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let handle = pm.init().unwrap();
    press_briefly_then_release(&host);

    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(6)
    ));
    assert!(host.calls().contains(&Call::Setup));
}

#[test]
fn cold_boot_unexplained_shuts_down_without_events() {
    let host = MockHost::new();
    // button never pressed, no charger, no wakeup cause.

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let _handle = pm.init().unwrap();

    assert!(wait_until(
        || host.shutdown_count.load(Ordering::SeqCst) >= 1,
        Duration::from_secs(2)
    ));
    // INIT keeps ticking after shutdown is requested (a real shutdown
    // adapter never returns control), so give it a few more ticks and
    // confirm the one-shot latch held rather than firing again.
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(host.shutdown_count.load(Ordering::SeqCst), 1);
}

#[test]
fn charger_insertion_then_long_press_reaches_setup() {
    let host = MockHost::new();
    host.charger_connected.store(true, Ordering::Release);

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let handle = pm.init().unwrap();

    assert!(wait_until(
        || handle.state() == DeviceState::OffCharger,
        Duration::from_secs(6)
    ));
    assert!(host.calls().contains(&Call::OffChargerSetup));

    // Hold the button long enough to classify as a long press.
    host.button_pressed.store(true, Ordering::Release);
    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(6)
    ));
    assert!(host.calls().contains(&Call::Setup));
}

#[test]
fn idle_timeout_with_sleep_action_reaches_sleep_prepare_adapter() {
    let host = MockHost::new();
    // A brief press is enough to move INIT -> SETUP; release well before
    // it would classify as a long/very-long press so it cannot also
    // trigger the reboot path while the device is idling.
    host.button_pressed.store(true, Ordering::Release);
    std::thread::sleep(Duration::from_millis(8));
    host.button_pressed.store(false, Ordering::Release);

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let handle = pm.init().unwrap();

    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(6)
    ));

    handle.idle_set_expired_action(IdleAction::Sleep);
    handle.idle_set_timeout(50);

    let received_idle_expired = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&received_idle_expired);
        handle
            .register_event_handler(EventKind::IdleTimerExpired, move |_, _| {
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
    }

    assert!(wait_until(
        || host.calls().iter().any(|c| *c == Call::Sleep),
        Duration::from_secs(6)
    ));
    assert!(wait_until(
        || received_idle_expired.load(Ordering::SeqCst),
        Duration::from_secs(1)
    ));
}

#[test]
fn active_lock_preempts_idle_shutdown() {
    let host = MockHost::new();
    host.button_pressed.store(true, Ordering::Release);

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let handle = pm.init().unwrap();
    // Release well before the classifier's debounce window elapses so the
    // button never escalates past PRESSED — otherwise a sustained press
    // would reach VeryLongPressed before the lock request is drained and
    // race the reboot-trigger branch in DEV_IDLE instead of exercising
    // the lock.
    press_briefly_then_release(&host);

    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(6)
    ));

    handle.idle_set_expired_action(IdleAction::Shutdown);
    handle.idle_set_timeout(50);
    handle.active_lock_acquire();

    assert!(wait_until(
        || handle.state() == DeviceState::DevActive,
        Duration::from_secs(2)
    ));
    // Give the idle window plenty of time to have expired if the lock
    // were not honored.
    std::thread::sleep(Duration::from_millis(200));
    assert!(!host.calls().contains(&Call::Shutdown));

    handle.active_lock_release();
    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(2)
    ));
}

#[test]
fn very_long_press_reboots() {
    let host = MockHost::new();
    host.button_pressed.store(true, Ordering::Release);

    let mut pm = PowerManagement::new(fast_timings());
    host.wire(&mut pm);
    let handle = pm.init().unwrap();

    assert!(wait_until(
        || handle.state() == DeviceState::DevIdle,
        Duration::from_secs(6)
    ));

    // Button stays held from boot; once it classifies as very-long-pressed
    // the lifecycle task should move to reboot.
    assert!(wait_until(
        || host.calls().contains(&Call::Reboot),
        Duration::from_secs(3)
    ));
}
