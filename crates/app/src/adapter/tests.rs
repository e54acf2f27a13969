use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use iotg_domain::device::{RESET_ACTION, RESET_EVENT, WriteState, all_devices};
use iotg_domain::endpoint::{Endpoint, Reading};
use iotg_domain::error::{GatewayError, Rejection};
use iotg_domain::event::Notification;
use iotg_domain::id::DeviceId;
use iotg_domain::value::{Value, ValueType};

use super::{Adapter, AdapterConfig, AdapterHandle};
use crate::event_bus::InProcessBus;
use crate::ports::HardwareChannel;

/// In-memory board: configurable status values, recorded writes.
#[derive(Default)]
struct FakeHardware {
    values: Mutex<HashMap<Reading, i64>>,
    failing_reads: Mutex<HashSet<Reading>>,
    failing_writes: Mutex<HashSet<Endpoint>>,
    hanging_writes: Mutex<HashSet<Endpoint>>,
    read_delay: Mutex<Option<Duration>>,
    write_delay: Mutex<Option<Duration>>,
    reads: Mutex<Vec<Reading>>,
    writes: Mutex<Vec<(Endpoint, String, Instant)>>,
}

impl FakeHardware {
    fn with_value(self, reading: Reading, raw: i64) -> Self {
        self.values.lock().unwrap().insert(reading, raw);
        self
    }

    fn failing_read(self, reading: Reading) -> Self {
        self.failing_reads.lock().unwrap().insert(reading);
        self
    }

    fn failing_write(self, endpoint: Endpoint) -> Self {
        self.failing_writes.lock().unwrap().insert(endpoint);
        self
    }

    fn hanging_write(self, endpoint: Endpoint) -> Self {
        self.hanging_writes.lock().unwrap().insert(endpoint);
        self
    }

    fn read_delay(self, delay: Duration) -> Self {
        *self.read_delay.lock().unwrap() = Some(delay);
        self
    }

    fn write_delay(self, delay: Duration) -> Self {
        *self.write_delay.lock().unwrap() = Some(delay);
        self
    }

    fn reads_of(&self, reading: Reading) -> usize {
        self.reads
            .lock()
            .unwrap()
            .iter()
            .filter(|r| **r == reading)
            .count()
    }

    fn writes(&self) -> Vec<(Endpoint, String)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(endpoint, value, _)| (*endpoint, value.clone()))
            .collect()
    }

    fn write_times(&self) -> Vec<Instant> {
        self.writes.lock().unwrap().iter().map(|(_, _, at)| *at).collect()
    }
}

impl HardwareChannel for FakeHardware {
    async fn read(&self, reading: Reading) -> Result<i64, GatewayError> {
        self.reads.lock().unwrap().push(reading);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        if self.failing_reads.lock().unwrap().contains(&reading) {
            return Err(GatewayError::hardware(std::io::Error::other("read failed")));
        }
        Ok(self
            .values
            .lock()
            .unwrap()
            .get(&reading)
            .copied()
            .unwrap_or_default())
    }

    async fn write(&self, endpoint: Endpoint, value: &str) -> Result<(), GatewayError> {
        self.writes
            .lock()
            .unwrap()
            .push((endpoint, value.to_string(), Instant::now()));
        let hang = self.hanging_writes.lock().unwrap().contains(&endpoint);
        if hang {
            std::future::pending::<()>().await;
        }
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        if self.failing_writes.lock().unwrap().contains(&endpoint) {
            return Err(GatewayError::hardware(std::io::Error::other("helper exited with 1")));
        }
        Ok(())
    }
}

struct Harness {
    hardware: Arc<FakeHardware>,
    handle: AdapterHandle,
    task: JoinHandle<()>,
    notifications: broadcast::Receiver<Notification>,
}

fn start(hardware: FakeHardware) -> Harness {
    start_with(hardware, AdapterConfig::default())
}

fn start_with(hardware: FakeHardware, config: AdapterConfig) -> Harness {
    let hardware = Arc::new(hardware);
    let bus = InProcessBus::new(1024);
    let notifications = bus.subscribe();
    let (handle, task) = Adapter::new(Arc::clone(&hardware), bus, config).spawn();
    Harness {
        hardware,
        handle,
        task,
        notifications,
    }
}

/// Let spawned IO tasks run without crossing a poll tick.
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

fn id(raw: &str) -> DeviceId {
    DeviceId::from(raw)
}

impl Harness {
    async fn write_state(&self, device: &str) -> WriteState {
        self.handle
            .thing(&id(device))
            .await
            .unwrap()
            .unwrap()
            .write_state
    }

    async fn property(&self, device: &str, name: &str) -> (Value, bool) {
        let thing = self.handle.thing(&id(device)).await.unwrap().unwrap();
        let property = thing.property(name).unwrap();
        (property.read().clone(), property.is_read_only())
    }

    fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            out.push(notification);
        }
        out
    }
}

#[tokio::test(start_paused = true)]
async fn should_announce_every_device_on_start() {
    let mut h = start(FakeHardware::default());
    let things = h.handle.things().await.unwrap();
    settle().await;

    assert_eq!(things.len(), 10);
    assert_eq!(things[0].id, id("battery"));
    assert_eq!(things[9].id, id("device_led"));
    let added = h
        .drain()
        .into_iter()
        .filter(|n| matches!(n, Notification::DeviceAdded { .. }))
        .count();
    assert_eq!(added, 10);
}

#[tokio::test(start_paused = true)]
async fn should_sync_control_state_on_announce() {
    let h = start(
        FakeHardware::default()
            .with_value(Reading::Status(Endpoint::CPU_PW_BLE), 1)
            .with_value(Reading::Status(Endpoint::SEL_SIM), 0),
    );
    settle().await;

    assert_eq!(h.property("device_ble", "Power").await.0, Value::Bool(true));
    assert_eq!(h.property("device_zigbee", "Power").await.0, Value::Bool(false));
    assert_eq!(h.property("device_sim", "SIM").await.0, Value::from("SIM2"));
}

#[tokio::test(start_paused = true)]
async fn should_poll_immediately_then_every_interval() {
    let h = start(FakeHardware::default().with_value(Reading::BatteryAdc, 512));
    settle().await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 1);
    assert_eq!(h.property("battery", "Voltage").await.0, Value::Number(2.5));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 2);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 3);
    assert_eq!(
        h.hardware
            .reads_of(Reading::Status(Endpoint::CPU_AMP_FAULT)),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn should_honour_configured_poll_interval() {
    let config = AdapterConfig {
        poll_interval: Duration::from_secs(30),
        ..AdapterConfig::default()
    };
    let h = start_with(FakeHardware::default(), config);
    sleep(Duration::from_secs(29)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 1);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 2);
}

#[tokio::test(start_paused = true)]
async fn should_write_and_release_gate_on_completion() {
    let mut h = start(FakeHardware::default());
    settle().await;
    h.drain();

    h.handle
        .set_property(&id("device_4g"), "Power", Value::Bool(true))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.hardware.writes(), vec![(Endpoint::CPU_PW_4G, "1".to_string())]);
    assert_eq!(h.write_state("device_4g").await, WriteState::Idle);
    assert_eq!(h.property("device_4g", "Power").await, (Value::Bool(true), false));

    let device_id = id("device_4g");
    assert_eq!(
        h.drain(),
        vec![
            Notification::PropertyChanged {
                device_id: device_id.clone(),
                property: "Power".to_string(),
                value: Value::Bool(true),
            },
            Notification::ReadOnlyChanged {
                device_id: device_id.clone(),
                property: "Power".to_string(),
                read_only: true,
            },
            Notification::ReadOnlyChanged {
                device_id,
                property: "Power".to_string(),
                read_only: false,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn should_drop_requests_while_write_in_flight() {
    let h = start(FakeHardware::default().hanging_write(Endpoint::CPU_PW_4G));
    settle().await;

    h.handle
        .set_property(&id("device_4g"), "Power", Value::Bool(true))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.write_state("device_4g").await, WriteState::Writing);
    assert_eq!(h.property("device_4g", "Power").await, (Value::Bool(true), true));

    h.handle
        .set_property(&id("device_4g"), "Power", Value::Bool(false))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.hardware.writes().len(), 1);
    assert_eq!(h.property("device_4g", "Power").await.0, Value::Bool(true));
}

#[tokio::test(start_paused = true)]
async fn should_keep_other_devices_writable_while_one_hangs() {
    let h = start(FakeHardware::default().hanging_write(Endpoint::CPU_PW_4G));
    settle().await;

    h.handle
        .set_property(&id("device_4g"), "Power", Value::Bool(true))
        .await
        .unwrap();
    h.handle
        .set_property(&id("device_wifi"), "Power", Value::Bool(true))
        .await
        .unwrap();
    sleep(Duration::from_secs(60)).await;

    assert_eq!(h.write_state("device_4g").await, WriteState::Writing);
    assert_eq!(h.write_state("device_wifi").await, WriteState::Idle);
}

#[tokio::test(start_paused = true)]
async fn should_pulse_reset_line_with_delay() {
    let mut h = start(FakeHardware::default());
    settle().await;
    h.drain();

    h.handle
        .invoke_action(&id("device_ble"), RESET_ACTION)
        .await
        .unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.write_state("device_ble").await, WriteState::ResetStep2);
    assert!(h.property("device_ble", "Power").await.1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        h.hardware.writes(),
        vec![
            (Endpoint::CPU_RST_BLE, "0".to_string()),
            (Endpoint::CPU_RST_BLE, "1".to_string()),
        ]
    );
    let times = h.hardware.write_times();
    assert!(times[1] - times[0] >= Duration::from_millis(500));
    assert_eq!(h.write_state("device_ble").await, WriteState::Idle);
    assert!(!h.property("device_ble", "Power").await.1);

    let resets = h
        .drain()
        .into_iter()
        .filter(|n| matches!(n, Notification::Event(event) if event.name == RESET_EVENT))
        .count();
    assert_eq!(resets, 1);
}

#[tokio::test(start_paused = true)]
async fn should_release_gate_when_write_fails() {
    let h = start(FakeHardware::default().failing_write(Endpoint::CPU_PWR_SPK));
    settle().await;

    h.handle
        .set_property(&id("device_speaker"), "Power", Value::Bool(true))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.write_state("device_speaker").await, WriteState::Idle);
    assert!(!h.property("device_speaker", "Power").await.1);
}

#[tokio::test(start_paused = true)]
async fn should_release_gate_after_write_timeout() {
    let config = AdapterConfig {
        write_timeout: Some(Duration::from_secs(2)),
        ..AdapterConfig::default()
    };
    let h = start_with(FakeHardware::default().hanging_write(Endpoint::CPU_AMP_PWR), config);
    settle().await;

    h.handle
        .set_property(&id("device_amp"), "Power", Value::Bool(true))
        .await
        .unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.write_state("device_amp").await, WriteState::Writing);

    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(h.write_state("device_amp").await, WriteState::Idle);
    assert!(!h.property("device_amp", "Power").await.1);
}

#[tokio::test(start_paused = true)]
async fn should_use_zero_for_failed_reads() {
    let h = start(
        FakeHardware::default()
            .with_value(Reading::BatteryAdc, 800)
            .with_value(Reading::BatteryLevel, 50)
            .failing_read(Reading::BatteryAdc),
    );
    settle().await;

    assert_eq!(h.property("battery", "ADC").await.0, Value::Int(0));
    assert_eq!(h.property("battery", "Voltage").await.0, Value::Number(0.0));
    assert_eq!(h.property("battery", "Level").await.0, Value::Int(50));
}

#[tokio::test(start_paused = true)]
async fn should_poll_again_when_previous_poll_outstanding() {
    let h = start(
        FakeHardware::default()
            .with_value(Reading::BatteryAdc, 1024)
            .read_delay(Duration::from_secs(7)),
    );
    sleep(Duration::from_millis(5_100)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 2);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.property("battery", "ADC").await.0, Value::Int(1024));
    assert_eq!(h.property("battery", "Voltage").await.0, Value::Number(5.0));
}

#[tokio::test(start_paused = true)]
async fn should_reject_invalid_values() {
    let h = start(FakeHardware::default());
    settle().await;

    let err = h
        .handle
        .set_property(&id("device_sim"), "SIM", Value::from("SIM3"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Rejected(Rejection::OutOfDomain { .. })
    ));

    let err = h
        .handle
        .set_property(&id("battery"), "Level", Value::Int(10))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(Rejection::ReadOnly(_))));

    let err = h
        .handle
        .invoke_action(&id("device_wifi"), RESET_ACTION)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Rejected(Rejection::UnknownAction(_))
    ));
    assert!(h.hardware.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn should_reject_removal_of_unknown_device() {
    let h = start(FakeHardware::default());
    let err = h.handle.remove_thing(&id("device_eth")).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
    assert_eq!(h.handle.things().await.unwrap().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn should_hide_removed_device() {
    let mut h = start(FakeHardware::default());
    settle().await;
    h.drain();

    h.handle.remove_thing(&id("device_amp")).await.unwrap();

    assert_eq!(h.handle.things().await.unwrap().len(), 9);
    assert!(h.handle.thing(&id("device_amp")).await.unwrap().is_none());
    assert_eq!(
        h.drain(),
        vec![Notification::DeviceRemoved {
            device_id: id("device_amp"),
        }]
    );
    let err = h
        .handle
        .set_property(&id("device_amp"), "Power", Value::Bool(true))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
    assert!(matches!(
        h.handle.remove_thing(&id("device_amp")).await,
        Err(GatewayError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn should_skip_removed_devices_when_polling() {
    let h = start(FakeHardware::default());
    settle().await;
    h.handle.remove_thing(&id("battery")).await.unwrap();

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 1);
    assert_eq!(
        h.hardware
            .reads_of(Reading::Status(Endpoint::CPU_AMP_FAULT)),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn should_recreate_removed_devices_on_pairing() {
    let h = start(FakeHardware::default());
    settle().await;
    h.handle.remove_thing(&id("device_amp")).await.unwrap();
    h.handle.start_pairing().await.unwrap();

    let things = h.handle.things().await.unwrap();
    assert_eq!(things.len(), 10);
    assert_eq!(things[7].id, id("device_amp"));
}

#[tokio::test(start_paused = true)]
async fn should_not_restart_scheduler_on_pairing() {
    let h = start(FakeHardware::default());
    settle().await;
    for _ in 0..3 {
        h.handle.start_pairing().await.unwrap();
    }
    h.handle.cancel_pairing().await.unwrap();
    settle().await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 1);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 2);
}

#[tokio::test(start_paused = true)]
async fn should_not_overlap_writes_after_remove_and_pairing() {
    let h = start(FakeHardware::default().write_delay(Duration::from_secs(1)));
    settle().await;

    h.handle
        .set_property(&id("device_amp"), "Power", Value::Bool(true))
        .await
        .unwrap();
    h.handle.remove_thing(&id("device_amp")).await.unwrap();
    h.handle.start_pairing().await.unwrap();
    settle().await;

    assert_eq!(h.write_state("device_amp").await, WriteState::Writing);
    assert_eq!(h.property("device_amp", "Power").await, (Value::Bool(true), true));
    h.handle
        .set_property(&id("device_amp"), "Power", Value::Bool(false))
        .await
        .unwrap();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(h.hardware.writes(), vec![(Endpoint::CPU_AMP_PWR, "1".to_string())]);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.write_state("device_amp").await, WriteState::Idle);
    assert_eq!(h.property("device_amp", "Power").await, (Value::Bool(true), false));

    h.handle
        .set_property(&id("device_amp"), "Power", Value::Bool(false))
        .await
        .unwrap();
    settle().await;
    let times = h.hardware.write_times();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn should_finish_reset_of_removed_device_silently() {
    let mut h = start(FakeHardware::default());
    settle().await;

    h.handle
        .invoke_action(&id("device_zwave"), RESET_ACTION)
        .await
        .unwrap();
    settle().await;
    h.handle.remove_thing(&id("device_zwave")).await.unwrap();
    h.drain();
    assert!(h.handle.thing(&id("device_zwave")).await.unwrap().is_none());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        h.hardware.writes(),
        vec![
            (Endpoint::CPU_RST_ZWAVE, "0".to_string()),
            (Endpoint::CPU_RST_ZWAVE, "1".to_string()),
        ]
    );
    assert!(h.drain().iter().all(|n| n.device_id() != &id("device_zwave")));

    h.handle.start_pairing().await.unwrap();
    assert_eq!(h.write_state("device_zwave").await, WriteState::Idle);
    assert!(!h.property("device_zwave", "Power").await.1);
}

#[tokio::test(start_paused = true)]
async fn should_discard_samples_for_previous_incarnation() {
    let h = start(
        FakeHardware::default()
            .with_value(Reading::BatteryAdc, 512)
            .read_delay(Duration::from_secs(1)),
    );
    settle().await;
    h.handle.remove_thing(&id("battery")).await.unwrap();
    h.handle.start_pairing().await.unwrap();

    // the old pass reads three values, one second each
    sleep(Duration::from_secs(4)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 1);
    assert_eq!(h.property("battery", "ADC").await.0, Value::Int(0));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.hardware.reads_of(Reading::BatteryAdc), 2);
    assert_eq!(h.property("battery", "ADC").await.0, Value::Int(512));
}

#[tokio::test(start_paused = true)]
async fn should_gate_only_the_control_properties_of_each_device() {
    let h = start(FakeHardware::default().write_delay(Duration::from_secs(1)));
    settle().await;

    for device in all_devices() {
        let kind = device.kind();
        if kind.control_endpoint().is_none() {
            continue;
        }
        let gated = kind.gated_properties();
        let before = h.handle.thing(device.id()).await.unwrap().unwrap();
        let property = before.property(gated[0]).unwrap();
        let value = match property.value_type() {
            ValueType::Boolean => Value::Bool(true),
            ValueType::Enumeration { values } => Value::from(*values.last().unwrap()),
            ValueType::Color => Value::from("#00FF00"),
            other => panic!("unexpected control domain {other:?}"),
        };

        h.handle
            .set_property(device.id(), gated[0], value)
            .await
            .unwrap();
        settle().await;
        let during = h.handle.thing(device.id()).await.unwrap().unwrap();
        for (old, new) in before.properties.iter().zip(&during.properties) {
            let expected = old.is_read_only() || gated.contains(&old.name.as_str());
            assert_eq!(new.is_read_only(), expected, "{} {}", device.id(), old.name);
        }

        sleep(Duration::from_secs(1)).await;
        let after = h.handle.thing(device.id()).await.unwrap().unwrap();
        for (old, new) in before.properties.iter().zip(&after.properties) {
            assert_eq!(new.is_read_only(), old.is_read_only(), "{} {}", device.id(), old.name);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn should_serialize_busy_snapshot_for_framework() {
    let h = start(FakeHardware::default().hanging_write(Endpoint::SEL_SIM));
    settle().await;
    h.handle
        .set_property(&id("device_sim"), "SIM", Value::from("SIM2"))
        .await
        .unwrap();

    let thing = h.handle.thing(&id("device_sim")).await.unwrap().unwrap();
    let json = serde_json::to_value(&thing).unwrap();
    assert_eq!(json["id"], "device_sim");
    assert_eq!(json["write_state"], "writing");
    assert_eq!(json["properties"][0]["name"], "SIM");
    assert_eq!(json["properties"][0]["value"], "SIM2");
    assert_eq!(json["properties"][0]["read_only"], true);
    assert_eq!(json["properties"][1]["read_only"], true);
}

#[tokio::test(start_paused = true)]
async fn should_stop_when_every_handle_is_dropped() {
    let h = start(FakeHardware::default());
    let clone = h.handle.clone();
    drop(h.handle);
    clone.cancel_remove_thing(&id("battery")).await.unwrap();
    drop(clone);

    tokio::time::timeout(Duration::from_secs(1), h.task)
        .await
        .unwrap()
        .unwrap();
}
