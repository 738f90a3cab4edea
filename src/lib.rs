// Time source shared by the simulators and the agent
pub mod clock;

// Simulated campus sensors
pub mod sensor;

// Notification store and delivery
pub mod notification;

// Campus analysis agent
pub mod agent;

// HTTP and WebSocket APIs
pub mod api;

// Configuration
pub mod config;
