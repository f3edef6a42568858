//! The weather store owns the latest weather snapshot and the icons decoded
//! for it. It is constructed once at startup, loaded from storage, and torn
//! down at shutdown.

use crate::{
    condition::{resolve_icon, IconId},
    icon::{DecodeError, IconDecoder},
    record::{CurrentWeather, ForecastWeather, PersistKey, Record, SunTimes},
    storage::{Storage, StorageError},
};
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Error writing key {key} to storage")]
    Storage {
        key: PersistKey,
        #[source]
        source: StorageError,
    },

    #[error("Error decoding {slot} icon (resource {resource_id})")]
    Decode {
        slot: IconSlot,
        resource_id: u32,
        #[source]
        source: DecodeError,
    },
}

/// Which of the two icons an operation refers to
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IconSlot {
    Current,
    Forecast,
}

impl Display for IconSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Forecast => write!(f, "forecast"),
        }
    }
}

/// Copy of all three records, for handing to the renderer or dumping
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub current: CurrentWeather,
    pub forecast: ForecastWeather,
    pub sun_times: SunTimes,
}

/// Owner of the weather records and their icons
pub struct WeatherStore<S, D: IconDecoder> {
    storage: S,
    decoder: D,
    current: CurrentWeather,
    forecast: ForecastWeather,
    sun_times: SunTimes,
    current_icon: Option<D::Image>,
    forecast_icon: Option<D::Image>,
}

impl<S: Storage, D: IconDecoder> WeatherStore<S, D> {
    /// Create a store with every record unknown and no icons
    pub fn new(storage: S, decoder: D) -> Self {
        Self {
            storage,
            decoder,
            current: CurrentWeather::unknown(),
            forecast: ForecastWeather::unknown(),
            sun_times: SunTimes::unknown(),
            current_icon: None,
            forecast_icon: None,
        }
    }

    /// Create a store and load whatever was persisted last time
    pub fn open(storage: S, decoder: D) -> Self {
        let mut store = Self::new(storage, decoder);
        store.load();
        store
    }

    pub fn current(&self) -> &CurrentWeather {
        &self.current
    }

    pub fn forecast(&self) -> &ForecastWeather {
        &self.forecast
    }

    pub fn sun_times(&self) -> &SunTimes {
        &self.sun_times
    }

    pub fn current_icon(&self) -> Option<&D::Image> {
        self.current_icon.as_ref()
    }

    pub fn forecast_icon(&self) -> Option<&D::Image> {
        self.forecast_icon.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current: self.current,
            forecast: self.forecast,
            sun_times: self.sun_times,
        }
    }

    pub fn set_current_temperature(&mut self, temperature: i32) {
        self.current.temperature = temperature;
    }

    pub fn set_forecast_temperatures(&mut self, high: i32, low: i32) {
        self.forecast.high_temp = high;
        self.forecast.low_temp = low;
    }

    pub fn set_sun_times(
        &mut self,
        rise_hour: i32,
        rise_minute: i32,
        set_hour: i32,
        set_minute: i32,
    ) {
        self.sun_times = SunTimes {
            rise_hour,
            rise_minute,
            set_hour,
            set_minute,
        };
    }

    /// Update the current and forecast conditions, swapping in new icons.
    /// `is_night` is accepted but not consulted: condition codes already
    /// distinguish day from night.
    ///
    /// Both icons are always processed. If either fails to decode, that slot
    /// is left empty and the first failure is returned.
    pub fn set_conditions(
        &mut self,
        condition_code: i32,
        is_night: bool,
        forecast_code: i32,
    ) -> Result<(), StoreError> {
        let current_icon = resolve_icon(condition_code);
        let forecast_icon = resolve_icon(forecast_code);
        info!(
            "Setting conditions: current={condition_code} ({current_icon:?}), \
            forecast={forecast_code} ({forecast_icon:?}), is_night={is_night}"
        );

        self.current.icon_id = current_icon.resource_id();
        self.forecast.icon_id = forecast_icon.resource_id();

        let current_result =
            self.replace_icon(IconSlot::Current, self.current.icon_id);
        let forecast_result =
            self.replace_icon(IconSlot::Forecast, self.forecast.icon_id);
        current_result.and(forecast_result)
    }

    /// Load every record from storage. Records are independent: a missing or
    /// corrupt one falls back to unknown values without affecting the others.
    pub fn load(&mut self) {
        info!("Loading weather from storage");

        match self.read_record::<CurrentWeather>() {
            Some(current) => {
                self.current = current;
                self.load_icon(IconSlot::Current, current.icon_id);
            }
            None => {
                self.current = CurrentWeather::unknown();
                self.current_icon = None;
            }
        }

        match self.read_record::<ForecastWeather>() {
            Some(forecast) => {
                self.forecast = forecast;
                self.load_icon(IconSlot::Forecast, forecast.icon_id);
            }
            None => {
                self.forecast = ForecastWeather::unknown();
                self.forecast_icon = None;
            }
        }

        self.sun_times = self.read_record().unwrap_or_else(SunTimes::unknown);
    }

    /// Write every record to storage, overwriting the previous snapshot. All
    /// writes are attempted even if one fails; the first failure is returned.
    pub fn save(&mut self) -> Result<(), StoreError> {
        info!("Saving weather to storage");
        let results = [
            self.write_record(self.current),
            self.write_record(self.forecast),
            self.write_record(self.sun_times),
        ];
        results.into_iter().collect()
    }

    /// Save and release both icons. The icons are released even if saving
    /// fails.
    pub fn teardown(mut self) -> Result<(), StoreError> {
        let result = self.save();
        self.current_icon = None;
        self.forecast_icon = None;
        debug!("Weather store torn down");
        result
    }

    fn slot_mut(&mut self, slot: IconSlot) -> &mut Option<D::Image> {
        match slot {
            IconSlot::Current => &mut self.current_icon,
            IconSlot::Forecast => &mut self.forecast_icon,
        }
    }

    /// Decode a fresh icon into a slot. The old icon is only dropped once the
    /// new one exists. On failure the slot is emptied, since the old icon no
    /// longer matches its record.
    fn replace_icon(
        &mut self,
        slot: IconSlot,
        resource_id: u32,
    ) -> Result<(), StoreError> {
        match self.decoder.decode(resource_id) {
            Ok(image) => {
                let old = self.slot_mut(slot).replace(image);
                drop(old);
                trace!("Replaced {slot} icon with resource {resource_id}");
                Ok(())
            }
            Err(source) => {
                error!(
                    "Error decoding {slot} icon from resource {resource_id}: \
                    {source:?}"
                );
                *self.slot_mut(slot) = None;
                Err(StoreError::Decode {
                    slot,
                    resource_id,
                    source,
                })
            }
        }
    }

    /// Decode a persisted icon during load. Failure is logged and leaves the
    /// slot empty. An ID that names no icon (e.g. 0, saved before any
    /// conditions were set) is skipped.
    fn load_icon(&mut self, slot: IconSlot, resource_id: u32) {
        if IconId::try_from(resource_id).is_err() {
            debug!("No {slot} icon stored (resource {resource_id})");
            *self.slot_mut(slot) = None;
            return;
        }
        // Load can't report errors, the failure is already logged
        let _ = self.replace_icon(slot, resource_id);
    }

    fn read_record<R: Record>(&self) -> Option<R> {
        if !self.storage.exists(R::KEY) {
            debug!("Key {} not in storage", R::KEY);
            return None;
        }

        // One extra byte so an oversized value is caught too
        let mut buf = vec![0; R::SIZE + 1];
        let read = match self.storage.read(R::KEY, &mut buf) {
            Ok(read) => read,
            Err(err) => {
                error!("Error reading key {} from storage: {err:?}", R::KEY);
                return None;
            }
        };
        let record = R::from_bytes(&buf[..read]);
        if record.is_none() {
            warn!(
                "Key {} holds {read} bytes, expected {}; ignoring it",
                R::KEY,
                R::SIZE
            );
        }
        record
    }

    fn write_record<R: Record>(&mut self, record: R) -> Result<(), StoreError> {
        let key = R::KEY;
        self.storage.write(key, &record.to_bytes()).map_err(|source| {
            error!("Error writing key {key} to storage: {source:?}");
            StoreError::Storage { key, source }
        })
    }
}
