//! Battery sensing and the task-watchdog hook.

use esp_idf_svc::sys;

use crate::epd13in3e::interface::Watchdog;
use crate::epd13in3e::splash::PowerSource;

// Legacy ADC1 oneshot configuration values.
const ADC_WIDTH_BIT_12: u32 = 3;
const ADC_ATTEN_DB_11: u32 = 3;
/// GPIO35, the battery divider input, is ADC1 channel 7.
const VBAT_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_7;

const ADC_FULL_SCALE: f32 = 4095.0;
const ADC_REF_VOLTS: f32 = 3.3;
/// The board halves the cell voltage before the ADC.
const DIVIDER_RATIO: f32 = 2.0;

/// Below this the divider is floating: USB power, no cell.
const NO_CELL_THRESHOLD_V: f32 = 3.0;
const CELL_EMPTY_V: f32 = 3.3;
const CELL_FULL_V: f32 = 4.2;

pub struct BatteryMonitor;

impl BatteryMonitor {
    pub fn new() -> Self {
        unsafe {
            sys::adc1_config_width(ADC_WIDTH_BIT_12);
            sys::adc1_config_channel_atten(VBAT_CHANNEL, ADC_ATTEN_DB_11);
        }
        BatteryMonitor
    }

    fn read_raw(&mut self) -> i32 {
        unsafe { sys::adc1_get_raw(VBAT_CHANNEL) as i32 }
    }
}

impl PowerSource for BatteryMonitor {
    fn battery_voltage(&mut self) -> f32 {
        self.read_raw() as f32 / ADC_FULL_SCALE * ADC_REF_VOLTS * DIVIDER_RATIO
    }

    fn battery_percent(&mut self) -> Option<i32> {
        let volts = self.battery_voltage();
        if volts < NO_CELL_THRESHOLD_V {
            return None;
        }
        let pct = (volts - CELL_EMPTY_V) / (CELL_FULL_V - CELL_EMPTY_V) * 100.0;
        Some(pct.clamp(0.0, 100.0) as i32)
    }
}

/// Feeds the ESP-IDF task watchdog while the panel blocks; a full refresh
/// runs for several seconds, well past the default watchdog window.
pub struct TaskWatchdog;

impl Watchdog for TaskWatchdog {
    fn feed(&mut self) {
        unsafe {
            sys::esp_task_wdt_reset();
        }
    }
}
