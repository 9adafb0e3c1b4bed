use crate::config::Config;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let config = match Config::from_file() {
        Ok(value) => value,
        Err(err) => {
            let mut message = format!("Config initialization failed. Error: {err}.");
            if let Some(additional_info) = err.additional_info() {
                message.push_str(&format!(" Additional_info: {additional_info}"));
            }
            println!("{}", message);
            std::process::exit(1);
        },
    };

    logging::setup(&config).unwrap_or_else(|err| {
        let mut message = format!("Logger initialization failed. Error: {err}.");
        if let Some(additional_info) = err.additional_info() {
            message.push_str(&format!(" Additional_info: {additional_info}"));
        }
        println!("{}", message);
        std::process::exit(1);
    });

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown_flag);
    if let Err(err) = ctrlc::set_handler(move || {
        log::info!("Shutdown requested.");
        handler_flag.store(true, Ordering::Release);
    }) {
        log::error!("Failed to set Ctrl-C handler: {}", err);
        std::process::exit(1);
    }

    if let Err(err) = core::start(config, shutdown_flag) {
        let mut message = format!("Capture failed. Error: {err}.");
        if let Some(additional_info) = err.additional_info() {
            message.push_str(&format!(" Additional_info: {additional_info}"));
        }
        log::error!("{}", message);
        std::process::exit(1);
    }
}

mod config;
mod core;
mod logging;
mod net;
