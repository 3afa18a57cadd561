mod commands;
mod config;

use std::io::{self, BufRead, Write};
use dotenv::dotenv;
use log::{debug, error, info, warn};
use lcd1602_gpio::delay::StdDelay;
use lcd1602_gpio::gpiod::GpiodDriver;
use lcd1602_gpio::lcd::hd44780::LcdDevice;
use sysinfo::System;
use crate::commands::Input;
use crate::config::Config;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("lcdctl starting on {}", System::host_name().as_deref().unwrap_or(UNKNOWN_STR));
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    debug!("Trying to load config...");
    let mut config = if let Some(config) = Config::try_load()? {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    config.apply_env()?;

    let assignment = config.assignment();
    info!(
        "LCD @ {} RS: {}, E: {}, Data: {:?}",
        config.chip, assignment.register_select, assignment.enable, assignment.data
    );

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&config.chip)?;
    debug!("{:?} initialized.", gpio);

    let mut lcd = LcdDevice::open(&gpio, StdDelay, config.lcd_config(), assignment)?;
    debug!("{:?} initialized.", lcd);

    info!("Reading lines from stdin, :quit to exit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;

        let input = match Input::parse(&line, config.line_offset) {
            Ok(input) => input,
            Err(err) => {
                warn!("{}", err);
                continue;
            }
        };

        match input {
            Input::Text(text) => match lcd.write(text.as_bytes()) {
                Ok(written) if written.truncated() => {
                    info!("Shown {} of {} bytes", written.accepted, written.requested)
                }
                Ok(_) => {}
                Err(err) => error!("Write failed: {}", err),
            },
            Input::Command(command) => {
                if let Err(err) = lcd.control(command) {
                    error!("{:?} failed: {}", command, err);
                }
            }
            Input::Read => {
                let mut buf = [0u8; 8];
                let mut offset = 0;
                loop {
                    let n = lcd.read(&mut buf, &mut offset);
                    if n == 0 {
                        break;
                    }
                    stdout.write_all(&buf[..n])?;
                }
                writeln!(stdout)?;
            }
            Input::State => writeln!(stdout, "{:?}", lcd.state())?,
            Input::Quit => break,
        }
    }

    lcd.close();
    info!("lcdctl exiting.");
    Ok(())
}
