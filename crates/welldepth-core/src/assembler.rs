use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime};

use crate::types::{DailyRecord, DailySource, GroundReferencedSample, ManualMeasurement};

/// All wells in one series ordered by (timestamp, well_id).
pub fn assemble_subdaily(mut samples: Vec<GroundReferencedSample>) -> Vec<GroundReferencedSample> {
    samples.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.well_id.cmp(&b.well_id))
    });
    samples
}

/// One value per well per day.
///
/// Logger days use the subdaily sample closest to `reference_time` (earlier on ties). Manual
/// readings with a depth fill the days that have no subdaily coverage. Ordered by
/// (well_id, timestamp).
pub fn assemble_daily(
    subdaily: &[GroundReferencedSample],
    manual: &[ManualMeasurement],
    reference_time: NaiveTime,
) -> Vec<DailyRecord> {
    let mut days: BTreeMap<(String, NaiveDate), DailyRecord> = BTreeMap::new();
    let mut covered: HashSet<(String, NaiveDate)> = HashSet::new();

    for sample in subdaily {
        let date = sample.timestamp.date();
        let key = (sample.well_id.clone(), date);
        covered.insert(key.clone());
        let target = date.and_time(reference_time);
        let distance = (sample.timestamp - target).abs();

        let replace = match days.get(&key) {
            Some(current) => {
                let current_distance = (current.timestamp - target).abs();
                distance < current_distance
                    || (distance == current_distance && sample.timestamp < current.timestamp)
            }
            None => true,
        };
        if replace {
            days.insert(
                key,
                DailyRecord {
                    well_id: sample.well_id.clone(),
                    timestamp: sample.timestamp,
                    ground_to_water_depth_m: sample.ground_to_water_depth_m,
                    source: DailySource::Logger,
                },
            );
        }
    }

    for measurement in manual.iter().filter(|m| m.water_present) {
        let Some(depth) = measurement.ground_to_water_m else {
            continue;
        };
        let date = measurement.timestamp.date();
        let key = (measurement.well_id.clone(), date);
        if covered.contains(&key) {
            continue;
        }
        let target = date.and_time(reference_time);
        let distance = (measurement.timestamp - target).abs();
        let replace = match days.get(&key) {
            Some(current) => distance < (current.timestamp - target).abs(),
            None => true,
        };
        if replace {
            days.insert(
                key,
                DailyRecord {
                    well_id: measurement.well_id.clone(),
                    timestamp: measurement.timestamp,
                    ground_to_water_depth_m: depth,
                    source: DailySource::Manual,
                },
            );
        }
    }

    days.into_values().collect()
}
