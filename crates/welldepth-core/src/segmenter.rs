use chrono::Duration;

use crate::types::{Deployment, Timestamped};

/// Deployment id of every item in an ascending series.
///
/// The counter advances whenever the gap to the previous item differs from `interval`;
/// the first item always opens deployment 0.
pub fn deployment_ids<T: Timestamped>(items: &[T], interval: Duration) -> Vec<u32> {
    let mut ids = Vec::with_capacity(items.len());
    let mut current: Option<u32> = None;
    let mut previous = None;

    for item in items {
        let ts = item.timestamp();
        let continues = previous.is_some_and(|prev| ts - prev == interval);
        let id = match (current, continues) {
            (Some(id), true) => id,
            (Some(id), false) => id + 1,
            (None, _) => 0,
        };
        current = Some(id);
        previous = Some(ts);
        ids.push(id);
    }
    ids
}

/// Splits one well's ascending samples into deployments.
pub fn segment<T: Timestamped>(well_id: &str, samples: Vec<T>, interval: Duration) -> Vec<Deployment<T>> {
    let ids = deployment_ids(&samples, interval);
    let mut deployments: Vec<Deployment<T>> = Vec::new();

    for (sample, id) in samples.into_iter().zip(ids) {
        match deployments.last_mut() {
            Some(deployment) if deployment.deployment_id == id => deployment.samples.push(sample),
            _ => deployments.push(Deployment {
                well_id: well_id.to_string(),
                deployment_id: id,
                samples: vec![sample],
            }),
        }
    }
    deployments
}
