//! Timestamped metrics
//!
//! A labelled counter/gauge family where every point carries the time of
//! the observation it represents rather than the time it was scraped.
//! Cloudflare analytics arrive minutes after the fact, so the exposition
//! has to say *when* the requests happened.
//!
//! Prometheus rejects samples that are too far in the past, so points whose
//! last observation is older than the family's `max_age` are left out of
//! the exposition entirely (they keep accumulating and reappear once a
//! fresh observation is added).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};

use crate::error::{MetricsError, Result};

/// Default age after which samples are withheld from exposition
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// How values combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Monotonic, accumulated with `add`
    Counter,
    /// Last write wins, replaced with `set`
    Gauge,
}

impl ValueKind {
    fn metric_type(self) -> MetricType {
        match self {
            Self::Counter => MetricType::COUNTER,
            Self::Gauge => MetricType::GAUGE,
        }
    }
}

/// Naming options, joined as `namespace_subsystem_name`
#[derive(Debug, Clone)]
pub struct MetricOpts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub const_labels: HashMap<String, String>,
}

impl MetricOpts {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            name: name.into(),
            help: help.into(),
            const_labels: HashMap::new(),
        }
    }

    /// Attach a label carried by every point of the family
    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    fn fq_name(&self) -> String {
        [&self.namespace, &self.subsystem, &self.name]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// One exposition sample
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Fully qualified metric name
    pub name: String,
    /// Constant and variable labels, sorted by name
    pub labels: Vec<(String, String)>,
    pub value: f64,
    /// Observation time, or the collection time for points never written
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Point {
    value: f64,
    observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Inner {
    desc: Desc,
    fq_name: String,
    help: String,
    kind: ValueKind,
    label_names: Vec<String>,
    const_labels: Vec<(String, String)>,
    max_age: TimeDelta,
    points: Mutex<BTreeMap<Vec<String>, Point>>,
}

/// A family of timestamped points keyed by label values
///
/// Cloning is cheap and every clone shares the same points, so one handle
/// can be registered with a `prometheus::Registry` while another is
/// written to by the ingestion loop.
#[derive(Debug, Clone)]
pub struct TimestampedMetricVec {
    inner: Arc<Inner>,
}

impl TimestampedMetricVec {
    /// Create a new family
    ///
    /// # Errors
    ///
    /// Returns an error if the name or a label name is not a valid
    /// Prometheus identifier.
    pub fn new(
        kind: ValueKind,
        opts: MetricOpts,
        label_names: &[&str],
        max_age: Duration,
    ) -> Result<Self> {
        let fq_name = opts.fq_name();
        let label_names: Vec<String> = label_names.iter().map(|l| l.to_string()).collect();
        let desc = Desc::new(
            fq_name.clone(),
            opts.help.clone(),
            label_names.clone(),
            opts.const_labels.clone(),
        )?;

        let mut const_labels: Vec<(String, String)> = opts.const_labels.into_iter().collect();
        const_labels.sort();

        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);

        Ok(Self {
            inner: Arc::new(Inner {
                desc,
                fq_name,
                help: opts.help,
                kind,
                label_names,
                const_labels,
                max_age,
                points: Mutex::new(BTreeMap::new()),
            }),
        })
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.inner.fq_name
    }

    pub fn kind(&self) -> ValueKind {
        self.inner.kind
    }

    /// Replace the point's value (gauge semantics)
    pub fn set(&self, label_values: &[&str], value: f64, observed_at: DateTime<Utc>) -> Result<()> {
        let key = self.key(label_values)?;
        let mut points = self.inner.points.lock();
        let point = points.entry(key).or_default();
        point.value = value;
        point.observed_at = Some(observed_at);
        Ok(())
    }

    /// Accumulate into the point's value (counter semantics)
    pub fn add(&self, label_values: &[&str], value: f64, observed_at: DateTime<Utc>) -> Result<()> {
        let key = self.key(label_values)?;
        let mut points = self.inner.points.lock();
        let point = points.entry(key).or_default();
        point.value += value;
        point.observed_at = Some(observed_at);
        Ok(())
    }

    /// Create the point if it does not exist, without recording an observation
    pub fn touch(&self, label_values: &[&str]) -> Result<()> {
        let key = self.key(label_values)?;
        self.inner.points.lock().entry(key).or_default();
        Ok(())
    }

    /// Current value of a point, if it exists
    pub fn value(&self, label_values: &[&str]) -> Option<f64> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.inner.points.lock().get(&key).map(|p| p.value)
    }

    /// Last observation time of a point, if one was recorded
    pub fn observed_at(&self, label_values: &[&str]) -> Option<DateTime<Utc>> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.inner.points.lock().get(&key).and_then(|p| p.observed_at)
    }

    /// Number of label sets seen so far
    pub fn len(&self) -> usize {
        self.inner.points.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples that should be exposed at `now`
    ///
    /// Points last observed more than `max_age` before `now` are skipped.
    /// The lock is held only while the points are copied out.
    pub fn collect_at(&self, now: DateTime<Utc>) -> impl Iterator<Item = Sample> + use<> {
        let cutoff = now.checked_sub_signed(self.inner.max_age);
        let snapshot: Vec<(Vec<String>, Point)> = self
            .inner
            .points
            .lock()
            .iter()
            .map(|(k, p)| (k.clone(), *p))
            .collect();

        let inner = Arc::clone(&self.inner);
        snapshot.into_iter().filter_map(move |(values, point)| {
            let timestamp = point.observed_at.unwrap_or(now);
            if let Some(cutoff) = cutoff
                && timestamp < cutoff
            {
                return None;
            }

            let mut labels = inner.const_labels.clone();
            labels.extend(inner.label_names.iter().cloned().zip(values));
            labels.sort();

            Some(Sample {
                name: inner.fq_name.clone(),
                labels,
                value: point.value,
                timestamp,
            })
        })
    }

    fn key(&self, label_values: &[&str]) -> Result<Vec<String>> {
        if label_values.len() != self.inner.label_names.len() {
            return Err(MetricsError::LabelCardinality {
                metric: self.inner.fq_name.clone(),
                expected: self.inner.label_names.len(),
                actual: label_values.len(),
            });
        }
        Ok(label_values.iter().map(|v| v.to_string()).collect())
    }

    fn to_proto(&self, sample: Sample) -> proto::Metric {
        let mut metric = proto::Metric::default();
        for (name, value) in sample.labels {
            let mut pair = LabelPair::default();
            pair.set_name(name);
            pair.set_value(value);
            metric.mut_label().push(pair);
        }

        match self.inner.kind {
            ValueKind::Counter => {
                let mut counter = proto::Counter::default();
                counter.set_value(sample.value);
                metric.set_counter(counter);
            }
            ValueKind::Gauge => {
                let mut gauge = proto::Gauge::default();
                gauge.set_value(sample.value);
                metric.set_gauge(gauge);
            }
        }

        metric.set_timestamp_ms(sample.timestamp.timestamp_millis());
        metric
    }
}

impl Collector for TimestampedMetricVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let samples: Vec<Sample> = self.collect_at(Utc::now()).collect();
        if samples.is_empty() {
            return Vec::new();
        }

        let mut family = MetricFamily::default();
        family.set_name(self.inner.fq_name.clone());
        family.set_help(self.inner.help.clone());
        family.set_field_type(self.inner.kind.metric_type());
        for sample in samples {
            family.mut_metric().push(self.to_proto(sample));
        }
        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 18, 10, 7, 0).unwrap()
    }

    fn opts() -> MetricOpts {
        MetricOpts::new("namespace", "subsystem", "name", "help").const_label("const", "constval")
    }

    #[test]
    fn test_counter_accumulates() {
        let metric = TimestampedMetricVec::new(ValueKind::Counter, opts(), &[], DEFAULT_MAX_AGE)
            .unwrap();
        metric.add(&[], 1.0, fixed_time()).unwrap();
        metric.add(&[], 3.0, fixed_time()).unwrap();

        let samples: Vec<_> = metric.collect_at(fixed_time()).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "namespace_subsystem_name");
        assert_eq!(samples[0].value, 4.0);
        assert_eq!(samples[0].timestamp, fixed_time());
        assert_eq!(
            samples[0].labels,
            vec![("const".to_string(), "constval".to_string())]
        );
    }

    #[test]
    fn test_gauge_replaces() {
        let metric =
            TimestampedMetricVec::new(ValueKind::Gauge, opts(), &[], DEFAULT_MAX_AGE).unwrap();
        metric.set(&[], 10.0, fixed_time()).unwrap();
        metric.set(&[], 3.2, fixed_time()).unwrap();

        assert_eq!(metric.value(&[]), Some(3.2));
    }

    #[test]
    fn test_timestamp_follows_latest_addition() {
        let vec = TimestampedMetricVec::new(
            ValueKind::Counter,
            opts(),
            &["l1", "l2"],
            DEFAULT_MAX_AGE,
        )
        .unwrap();

        let t1 = fixed_time() + TimeDelta::seconds(1);
        let t2 = fixed_time() + TimeDelta::seconds(2);
        vec.add(&["foo", "bar"], 1.0, t1).unwrap();
        vec.add(&["foo", "bar"], 2.0, t2).unwrap();
        vec.add(&["foo", "baz"], 10.0, t1).unwrap();

        assert_eq!(vec.value(&["foo", "bar"]), Some(3.0));
        assert_eq!(vec.observed_at(&["foo", "bar"]), Some(t2));
        assert_eq!(vec.observed_at(&["foo", "baz"]), Some(t1));
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn test_samples_sorted_and_labelled() {
        let vec =
            TimestampedMetricVec::new(ValueKind::Counter, opts(), &["l1", "l2"], DEFAULT_MAX_AGE)
                .unwrap();
        vec.add(&["foo", "baz"], 10.0, fixed_time()).unwrap();
        vec.add(&["banana", "potato"], 100.0, fixed_time()).unwrap();

        let samples: Vec<_> = vec.collect_at(fixed_time()).collect();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].labels,
            vec![
                ("const".to_string(), "constval".to_string()),
                ("l1".to_string(), "banana".to_string()),
                ("l2".to_string(), "potato".to_string()),
            ]
        );
        assert_eq!(samples[1].value, 10.0);
    }

    #[test]
    fn test_stale_points_are_withheld() {
        let vec = TimestampedMetricVec::new(
            ValueKind::Counter,
            opts(),
            &["zone"],
            Duration::from_secs(15 * 60),
        )
        .unwrap();
        let now = fixed_time();
        vec.add(&["old"], 1.0, now - TimeDelta::minutes(16)).unwrap();
        vec.add(&["fresh"], 1.0, now - TimeDelta::minutes(14)).unwrap();

        let samples: Vec<_> = vec.collect_at(now).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].labels[1].1, "fresh");
        assert_eq!(samples[0].timestamp, now - TimeDelta::minutes(14));

        // The stale point keeps its value and comes back once observed again
        vec.add(&["old"], 2.0, now).unwrap();
        let samples: Vec<_> = vec.collect_at(now).collect();
        assert_eq!(samples.len(), 2);
        assert_eq!(vec.value(&["old"]), Some(3.0));
    }

    #[test]
    fn test_untouched_point_reports_collection_time() {
        let vec =
            TimestampedMetricVec::new(ValueKind::Counter, opts(), &["zone"], DEFAULT_MAX_AGE)
                .unwrap();
        vec.touch(&["new"]).unwrap();

        let now = fixed_time();
        let samples: Vec<_> = vec.collect_at(now).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp, now);
        assert_eq!(samples[0].value, 0.0);
    }

    #[test]
    fn test_label_cardinality_checked() {
        let vec =
            TimestampedMetricVec::new(ValueKind::Counter, opts(), &["a", "b"], DEFAULT_MAX_AGE)
                .unwrap();
        let err = vec.add(&["only-one"], 1.0, fixed_time()).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::LabelCardinality {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(vec.is_empty());
    }

    #[test]
    fn test_invalid_label_name_rejected() {
        let result = TimestampedMetricVec::new(
            ValueKind::Counter,
            opts(),
            &["not-valid"],
            DEFAULT_MAX_AGE,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collector_emits_timestamps() {
        let vec =
            TimestampedMetricVec::new(ValueKind::Counter, opts(), &["zone"], DEFAULT_MAX_AGE)
                .unwrap();
        let observed = Utc::now() - TimeDelta::minutes(1);
        vec.add(&["a-zone"], 5.0, observed).unwrap();

        let families = vec.collect();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.get_name(), "namespace_subsystem_name");
        assert_eq!(family.get_field_type(), MetricType::COUNTER);

        let metric = &family.get_metric()[0];
        assert_eq!(metric.get_counter().get_value(), 5.0);
        assert_eq!(metric.get_timestamp_ms(), observed.timestamp_millis());
        assert_eq!(metric.get_label()[1].get_name(), "zone");
        assert_eq!(metric.get_label()[1].get_value(), "a-zone");
    }

    #[test]
    fn test_collector_skips_empty_family() {
        let vec = TimestampedMetricVec::new(ValueKind::Gauge, opts(), &["zone"], DEFAULT_MAX_AGE)
            .unwrap();
        assert!(vec.collect().is_empty());
    }

    #[test]
    fn test_concurrent_adds_do_not_lose_updates() {
        let vec =
            TimestampedMetricVec::new(ValueKind::Counter, opts(), &["zone"], DEFAULT_MAX_AGE)
                .unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let vec = vec.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        vec.add(&["z"], 1.0, fixed_time()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(vec.value(&["z"]), Some(8000.0));
    }
}
