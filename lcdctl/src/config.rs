use std::env::var;
use std::env::var_os;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use eyre::WrapErr;
use lcd1602_gpio::lcd::hd44780::{DisplayMode, Font, LcdConfig, PinAssignment};
use log::debug;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "lcd1602.json";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct PinsConfig {
    pub rs: usize,
    pub e: usize,
    /// D4..D7 of the display.
    pub data: [usize; 4],
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum FontConfig {
    #[default]
    #[serde(rename = "5x8")]
    Dots5x8,
    #[serde(rename = "5x10")]
    Dots5x10,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// GPIO chip device the pins live on.
    pub chip: String,
    /// Added to every pin number, for chips whose line numbers do not start at the header
    /// numbering.
    pub line_offset: usize,
    pub pins: PinsConfig,
    pub font: FontConfig,
    pub cursor: bool,
    pub blink: bool,
    pub scroll_delay_ms: u64,
    pub repaint_on_read: bool,
}

impl Config {
    /// Loads the config file named by `CONFIG_FILE`, or `lcd1602.json`.
    ///
    /// Returns `Ok(None)` only if the file does not exist. A file that cannot be read or parsed is
    /// an error, so it is never silently replaced by the defaults.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> eyre::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path).wrap_err_with(|| format!("Cannot open {}", path.display()))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Overrides the pins with `LCD1602_PIN_RS`, `LCD1602_PIN_E` and `LCD1602_PINS_DATA`, where
    /// set.
    pub fn apply_env(&mut self) -> eyre::Result<()> {
        if let Ok(rs) = var("LCD1602_PIN_RS") {
            self.pins.rs = rs.trim().parse()?;
        }
        if let Ok(e) = var("LCD1602_PIN_E") {
            self.pins.e = e.trim().parse()?;
        }
        if let Ok(data) = var("LCD1602_PINS_DATA") {
            self.pins.data = parse_pin_bus(&data)?;
        }
        debug!("Pins after env overrides: {:?}", self.pins);
        Ok(())
    }

    pub fn assignment(&self) -> PinAssignment {
        self.pins.assignment(self.line_offset)
    }

    pub fn lcd_config(&self) -> LcdConfig {
        LcdConfig {
            mode: DisplayMode {
                font: match self.font {
                    FontConfig::Dots5x8 => Font::Dots5x8,
                    FontConfig::Dots5x10 => Font::Dots5x10,
                },
                cursor: self.cursor,
                blink: self.blink,
            },
            scroll_delay: Duration::from_millis(self.scroll_delay_ms),
            repaint_on_read: self.repaint_on_read,
            ..Default::default()
        }
    }
}

impl PinsConfig {
    pub fn assignment(&self, line_offset: usize) -> PinAssignment {
        PinAssignment::new(
            self.rs + line_offset,
            self.e + line_offset,
            self.data.map(|pin| pin + line_offset),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chip: "/dev/gpiochip0".to_string(),
            line_offset: 0,
            pins: PinsConfig {
                rs: 6,
                e: 19,
                data: [12, 16, 20, 21],
            },
            font: FontConfig::default(),
            cursor: false,
            blink: false,
            scroll_delay_ms: 250,
            repaint_on_read: false,
        }
    }
}

fn config_path() -> PathBuf {
    var_os("CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub fn parse_pin_bus(pin_str: &str) -> eyre::Result<[usize; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of data pins"))
}
