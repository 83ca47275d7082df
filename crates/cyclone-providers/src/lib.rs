//! Cyclone providers - third-party API clients
//!
//! Weather lookups go to OpenWeatherMap; alert messages go to Twilio.

pub mod openweather;
pub mod twilio;

pub use openweather::{OpenWeatherClient, DEFAULT_OPENWEATHER_URL};
pub use twilio::{delivery_mode, MessagingCredentials, TwilioClient, TwilioCredentials, DEFAULT_TWILIO_URL};
