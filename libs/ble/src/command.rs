use std::sync::{Arc, Mutex};
use esp_idf_svc::{
    bt::{
        ble::{
            gap::{AdvConfiguration, BleGapEvent, EspBleGap},
            gatt::{
                server::{ConnectionId, EspGatts, GattsEvent, TransferId},
                AutoResponse, GattCharacteristic, GattId, GattInterface,
                GattResponse, GattServiceId, GattStatus, Handle, Permission, Property,
            },
        },
        BdAddr, Ble, BtDriver, BtStatus, BtUuid,
    },
    sys::{EspError, ESP_FAIL},
};
use enumset::enum_set;
use log::{error, info, warn};
use crate::{CHAR_COMMAND_UUID, SERVICE_COMMAND_UUID};

const APP_ID: u16 = 0;
const MAX_CONNECTIONS: usize = 1;
const COMMAND_MAX_LEN: usize = 64;

type Gap = EspBleGap<'static, Ble, Arc<BtDriver<'static, Ble>>>;
type Gatts = EspGatts<'static, Ble, Arc<BtDriver<'static, Ble>>>;
type WriteHandler = Box<dyn Fn(&[u8]) + Send + Sync>;


pub struct BleComm;

impl BleComm {
    /// Start advertising and serving commands
    ///
    /// `on_write` is called for each write to the command characteristic.
    pub fn run<F>(bt: BtDriver<'static, Ble>, name: String, on_write: F) -> Result<Arc<CommandPeripheral>, EspError>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let bt = Arc::new(bt);
        let gap = Arc::new(EspBleGap::new(bt.clone())?);
        let gatts = Arc::new(EspGatts::new(bt.clone())?);

        let peripheral = CommandPeripheral::new(gap.clone(), gatts, name, Box::new(on_write));

        let cloned = peripheral.clone();
        gap.subscribe(move |event| cloned.on_gap_event(&event))?;
        peripheral.clone().start()?;

        Ok(peripheral)
    }
}


#[derive(Debug, Clone)]
struct Connection {
    peer: BdAddr,
    conn_id: Handle,
}

struct PeripheralState {
    name: String,
    service_handle: Option<Handle>,
    command_handle: Option<Handle>,
    connections: Vec<Connection>,
    response: GattResponse,
}

pub struct CommandPeripheral {
    gap: Arc<Gap>,
    gatts: Arc<Gatts>,
    state: Mutex<PeripheralState>,
    on_write: WriteHandler,
}

impl CommandPeripheral {
    fn new(gap: Arc<Gap>, gatts: Arc<Gatts>, name: String, on_write: WriteHandler) -> Arc<Self> {
        Arc::new(Self {
            gap,
            gatts,
            state: Mutex::new(PeripheralState {
                name,
                service_handle: None,
                command_handle: None,
                connections: Vec::new(),
                response: GattResponse::default(),
            }),
            on_write,
        })
    }

    fn start(self: Arc<Self>) -> Result<(), EspError> {
        let cloned = self.clone();
        self.gatts.subscribe(move |(gatt_if, event)| cloned.on_gatts_event(gatt_if, event))?;
        self.gatts.register_app(APP_ID)?;
        Ok(())
    }

    fn on_gap_event(&self, event: &BleGapEvent) {
        if let BleGapEvent::AdvertisingConfigured(status) = event {
            if *status != BtStatus::Success {
                warn!("Unexpected status {:?}", status);
            } else if let Err(e) = self.gap.start_advertising() {
                error!("Unable to start adv: {:?}", e);
            } else {
                info!("Advertising as '{}'", self.state.lock().unwrap().name);
            }
        }
    }

    fn on_gatts_event(&self, gatt_if: GattInterface, event: GattsEvent) {
        fn check_gatt_status(status: GattStatus) -> bool {
            match status {
                GattStatus::Ok => true,
                _ => {
                    warn!("Unexpected status: {:?}", status);
                    false
                }
            }
        }
        fn check_result(r: Result<(), EspError>) {
            if let Err(e) = r {
                error!("Unexpected error: {:?}", e);
            }
        }

        match event {
            GattsEvent::ServiceRegistered { status, app_id } => {
                if check_gatt_status(status) && app_id == APP_ID {
                    check_result(self.create_service(gatt_if));
                }
            }
            GattsEvent::ServiceCreated { status, service_handle, .. } => {
                if check_gatt_status(status) {
                    check_result(self.configure_and_start_service(service_handle));
                }
            }
            GattsEvent::CharacteristicAdded { status, attr_handle, service_handle, char_uuid } => {
                if check_gatt_status(status) {
                    self.register_characteristic(service_handle, attr_handle, char_uuid);
                }
            }
            GattsEvent::PeerConnected { conn_id, addr, .. } => {
                check_result(self.create_conn(conn_id, addr));
            }
            GattsEvent::PeerDisconnected { addr, .. } => {
                self.delete_conn(addr);
            }
            GattsEvent::Write { conn_id, trans_id, handle, offset, need_rsp, is_prep, value, .. } => {
                if self.recv(conn_id, handle, value) {
                    check_result(self.send_write_response(
                        gatt_if, conn_id, trans_id, handle, offset, need_rsp, is_prep, value,
                    ));
                }
            }
            _ => (),
        }
    }

    fn create_service(&self, gatt_if: GattInterface) -> Result<(), EspError> {
        let name = self.state.lock().unwrap().name.clone();

        self.gap.set_device_name(&name)?;
        self.gap.set_adv_conf(&AdvConfiguration {
            include_name: true,
            include_txpower: true,
            flag: 2,
            service_uuid: Some(BtUuid::uuid128(SERVICE_COMMAND_UUID)),
            ..Default::default()
        })?;
        self.gatts.create_service(
            gatt_if,
            &GattServiceId {
                id: GattId {
                    uuid: BtUuid::uuid128(SERVICE_COMMAND_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            },
            4,
        )?;

        Ok(())
    }

    fn configure_and_start_service(&self, service_handle: Handle) -> Result<(), EspError> {
        self.state.lock().unwrap().service_handle = Some(service_handle);

        self.gatts.start_service(service_handle)?;
        self.gatts.add_characteristic(
            service_handle,
            &GattCharacteristic {
                uuid: BtUuid::uuid128(CHAR_COMMAND_UUID),
                permissions: enum_set!(Permission::Write),
                properties: enum_set!(Property::Write),
                max_len: COMMAND_MAX_LEN,
                auto_rsp: AutoResponse::ByApp,
            },
            &[],
        )?;

        Ok(())
    }

    fn register_characteristic(&self, service_handle: Handle, attr_handle: Handle, char_uuid: BtUuid) {
        let mut state = self.state.lock().unwrap();
        if state.service_handle == Some(service_handle) && char_uuid == BtUuid::uuid128(CHAR_COMMAND_UUID) {
            state.command_handle = Some(attr_handle);
        }
    }

    fn create_conn(&self, conn_id: ConnectionId, addr: BdAddr) -> Result<(), EspError> {
        let added = {
            let mut state = self.state.lock().unwrap();
            if state.connections.len() < MAX_CONNECTIONS {
                state.connections.push(Connection { peer: addr, conn_id });
                true
            } else {
                false
            }
        };

        if added {
            info!("Connected: {:?}", addr);
            self.gap.set_conn_params_conf(addr, 10, 20, 0, 400)?;
        } else {
            warn!("Connection from {:?} ignored, already connected", addr);
        }

        Ok(())
    }

    fn delete_conn(&self, addr: BdAddr) {
        let mut state = self.state.lock().unwrap();

        if let Some(index) = state.connections.iter().position(|Connection { peer, .. }| *peer == addr) {
            state.connections.swap_remove(index);
            info!("Disconnected: {:?}", addr);
        }

        if state.connections.is_empty() {
            if let Err(e) = self.gap.start_advertising() {
                error!("Unable to restart adv: {:?}", e);
            }
        }
    }

    /// Handle a write, return true if it targets the command characteristic
    fn recv(&self, conn_id: ConnectionId, handle: Handle, value: &[u8]) -> bool {
        {
            let state = self.state.lock().unwrap();
            if state.command_handle != Some(handle) {
                return false;
            }
            if !state.connections.iter().any(|conn| conn.conn_id == conn_id) {
                return false;
            }
        }
        // Lock released: the handler may take its time
        (self.on_write)(value);
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn send_write_response(
        &self,
        gatt_if: GattInterface,
        conn_id: ConnectionId,
        trans_id: TransferId,
        handle: Handle,
        offset: u16,
        need_rsp: bool,
        is_prep: bool,
        value: &[u8],
    ) -> Result<(), EspError> {
        if !need_rsp {
            return Ok(());
        }

        if is_prep {
            let mut state = self.state.lock().unwrap();

            state
                .response
                .attr_handle(handle)
                .auth_req(0)
                .offset(offset)
                .value(value)
                .map_err(|_| EspError::from_infallible::<ESP_FAIL>())?;

            self.gatts.send_response(gatt_if, conn_id, trans_id, GattStatus::Ok, Some(&state.response))?;
        } else {
            self.gatts.send_response(gatt_if, conn_id, trans_id, GattStatus::Ok, None)?;
        }

        Ok(())
    }
}
