//! Simulated smart-bulb controller.
//!
//! Commands fan out to every targeted bulb concurrently and only answer once
//! all of them have. No network traffic: each bulb update is logged.

use anyhow::{anyhow, Result};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use crate::registry::{async_handler, Handler, ParamMap, ToolModule};

const DEVICES: &[(&str, &str)] = &[
    ("bottom lamp light", "192.168.0.153"),
    ("middle lamp light", "192.168.0.91"),
    ("mushroom light", "192.168.0.228"),
    ("top lamp light", "192.168.0.149"),
];

static ALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(all|everything|my lights)\b").expect("static pattern"));
static LEVEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s?%?").expect("static pattern"));
static WARM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwarm(er)?\b").expect("static pattern"));
static COOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(cool(er)?|cold(er)?)\b").expect("static pattern"));

#[derive(Debug, Default, Clone, Copy)]
pub struct Lights;

impl ToolModule for Lights {
    fn spec(&self) -> Option<Value> {
        Some(json!({
            "intent": "light_control",
            "description": "Control smart lights (on/off/brightness/temperature)",
            "commands": {
                "turn_on": {
                    "examples": ["turn on", "switch on", "turn on my lights", "lights on", "illuminate"],
                    "params": ["device"],
                    "defaults": { "device": "all" },
                    "function": "turn_on"
                },
                "turn_off": {
                    "examples": ["turn off", "switch off", "turn off my lights", "lights off", "kill lights"],
                    "params": ["device"],
                    "defaults": { "device": "all" },
                    "function": "turn_off"
                },
                "set_brightness": {
                    "examples": [
                        "dim lights", "brighten", "set brightness to 50", "make it brighter",
                        "increase brightness", "decrease brightness", "make my lights dimmer",
                        "make my lights brighter"
                    ],
                    "params": ["device", "brightness"],
                    "defaults": { "device": "all", "brightness": 128 },
                    "function": "set_brightness"
                },
                "set_color_temp": {
                    "examples": ["make it warmer", "make it cooler", "set color temperature", "change tone"],
                    "params": ["device", "color_temp"],
                    "defaults": { "device": "all", "color_temp": "warm" },
                    "choices": { "color_temp": ["warm", "cool"] },
                    "function": "set_color_temp"
                }
            }
        }))
    }

    fn handler(&self, function: &str) -> Option<Handler> {
        match function {
            "turn_on" => Some(async_handler(turn_on)),
            "turn_off" => Some(async_handler(turn_off)),
            "set_brightness" => Some(async_handler(set_brightness)),
            "set_color_temp" => Some(async_handler(set_color_temp)),
            _ => None,
        }
    }

    fn resolve_params(&self, text: &str) -> Result<ParamMap> {
        let t = text.to_lowercase();
        let mut out = ParamMap::new();

        if ALL.is_match(&t) || t.trim() == "lights" {
            out.insert("device".into(), json!("all"));
        } else if let Some((name, _)) = DEVICES.iter().find(|(name, _)| t.contains(name)) {
            out.insert("device".into(), json!(name));
        }

        if let Some(level) = LEVEL.captures(&t).and_then(|c| c[1].parse::<i64>().ok()) {
            out.insert("brightness".into(), json!(level));
        }

        if WARM.is_match(&t) {
            out.insert("color_temp".into(), json!("warm"));
        } else if COOL.is_match(&t) {
            out.insert("color_temp".into(), json!("cool"));
        }

        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pilot {
    On,
    Off,
    Brightness(u8),
    Temperature(u32),
}

async fn turn_on(params: ParamMap) -> Result<String> {
    let label = apply(device(&params), Pilot::On).await?;
    Ok(format!("Turning on {}.", label))
}

async fn turn_off(params: ParamMap) -> Result<String> {
    let label = apply(device(&params), Pilot::Off).await?;
    Ok(format!("Turning off {}.", label))
}

async fn set_brightness(params: ParamMap) -> Result<String> {
    // 0-100 reads as a percentage, anything above as a raw 0-255 level.
    let requested = number(params.get("brightness")).unwrap_or(128);
    let raw = if requested <= 100 {
        (requested as f64 / 100.0 * 255.0).round() as i64
    } else {
        requested
    };
    let level = raw.clamp(10, 255) as u8;

    let label = apply(device(&params), Pilot::Brightness(level)).await?;
    let pct = (level as f64 / 255.0 * 100.0).round() as u8;
    Ok(format!("Set brightness of {} to {}%.", label, pct))
}

async fn set_color_temp(params: ParamMap) -> Result<String> {
    let kelvin = match params.get("color_temp") {
        Some(Value::String(s)) if s.contains("warm") => 2700,
        Some(Value::String(s)) if s.contains("cool") => 6000,
        other => number(other).unwrap_or(3000),
    };
    let kelvin = kelvin.clamp(2200, 6500) as u32;

    let label = apply(device(&params), Pilot::Temperature(kelvin)).await?;
    Ok(format!("Set color temperature of {} to {}K.", label, kelvin))
}

fn device(params: &ParamMap) -> Option<&str> {
    params.get("device").and_then(Value::as_str)
}

fn number(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

/// Bulbs addressed by `device`: everything for `None`/"all", else partial name match.
fn targets(device: Option<&str>) -> Vec<(&'static str, &'static str)> {
    match device {
        None | Some("all") => DEVICES.to_vec(),
        Some(name) => {
            let name = name.to_lowercase();
            DEVICES
                .iter()
                .copied()
                .filter(|(device, _)| device.contains(name.as_str()))
                .collect()
        }
    }
}

/// Sends `pilot` to every target at once; returns the label for the reply.
async fn apply(device: Option<&str>, pilot: Pilot) -> Result<String> {
    let targets = targets(device);
    if targets.is_empty() {
        return Err(anyhow!("no light matches '{}'", device.unwrap_or_default()));
    }

    let updates = targets.iter().map(|&(name, address)| send_pilot(name, address, pilot));
    join_all(updates).await.into_iter().collect::<Result<Vec<()>>>()?;

    Ok(match device {
        None | Some("all") => "all lights".to_string(),
        Some(name) => name.to_string(),
    })
}

async fn send_pilot(name: &str, address: &str, pilot: Pilot) -> Result<()> {
    info!(light = name, address, ?pilot, "[LIGHTS] update");
    Ok(())
}
