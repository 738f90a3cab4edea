// HTTP and WebSocket APIs

mod error;
pub mod agent;
pub mod notifications;
pub mod sensors;
pub mod websocket;

pub use agent::{create_agent_router, AgentAppState};
pub use notifications::{create_notification_router, NotificationAppState};
pub use sensors::{create_sensor_router, SensorAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};
