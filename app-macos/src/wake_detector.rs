// src/wake_detector.rs
//
// Forwards macOS lifecycle notifications into the logger's event hub.
// Sleep, wake and power-off come from NSWorkspace; termination from NSApplication.

use log::info;
use objc2::{ClassType, MainThreadOnly, define_class, rc::Retained};
use objc2_app_kit::NSWorkspace;
use objc2_foundation::{NSNotification, NSNotificationCenter, NSObject, NSObjectProtocol, NSString};
use vsaver_log_core::{EventHub, SystemEvent};

fn forward(event: SystemEvent) {
    info!("macOS lifecycle notification: {:?}", event);
    EventHub::global().post(event);
}

// Observer class for workspace and application lifecycle notifications
define_class!(
    // SAFETY:
    // - The superclass NSObject does not have any subclassing requirements.
    // - LifecycleObserver does not implement Drop.
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "VSSLifecycleObserver"]
    pub struct LifecycleObserver;

    unsafe impl NSObjectProtocol for LifecycleObserver {}

    impl LifecycleObserver {
        #[unsafe(method(workspaceWillSleep:))]
        fn workspace_will_sleep(&self, _notification: &NSNotification) {
            forward(SystemEvent::WillSleep);
        }

        #[unsafe(method(workspaceDidWake:))]
        fn workspace_did_wake(&self, _notification: &NSNotification) {
            forward(SystemEvent::DidWake);
        }

        #[unsafe(method(workspaceWillPowerOff:))]
        fn workspace_will_power_off(&self, _notification: &NSNotification) {
            forward(SystemEvent::WillTerminate);
        }

        #[unsafe(method(applicationWillTerminate:))]
        fn application_will_terminate(&self, _notification: &NSNotification) {
            forward(SystemEvent::WillTerminate);
        }
    }
);

impl LifecycleObserver {
    /// Create a new LifecycleObserver
    pub fn new() -> Retained<Self> {
        let cls = Self::class();
        unsafe {
            let obj: Retained<Self> = objc2::msg_send![cls, new];
            obj
        }
    }
}

/// Register the observer for sleep/wake/power-off and app termination.
/// Keep the returned observer alive for as long as notifications should flow.
pub fn setup_lifecycle_observer() -> Retained<LifecycleObserver> {
    info!("Setting up lifecycle observer for sleep/wake/terminate");

    let observer = LifecycleObserver::new();

    let workspace_center = NSWorkspace::sharedWorkspace().notificationCenter();
    let default_center = NSNotificationCenter::defaultCenter();

    let registrations = [
        (&workspace_center, objc2::sel!(workspaceWillSleep:), "NSWorkspaceWillSleepNotification"),
        (&workspace_center, objc2::sel!(workspaceDidWake:), "NSWorkspaceDidWakeNotification"),
        (&workspace_center, objc2::sel!(workspaceWillPowerOff:), "NSWorkspaceWillPowerOffNotification"),
        (&default_center, objc2::sel!(applicationWillTerminate:), "NSApplicationWillTerminateNotification"),
    ];

    for (center, selector, name) in registrations {
        let name = NSString::from_str(name);
        unsafe {
            center.addObserver_selector_name_object(&observer, selector, Some(&name), None);
        }
    }

    info!("Lifecycle observer registered successfully");
    observer
}
