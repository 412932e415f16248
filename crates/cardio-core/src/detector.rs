//! Streaming PQRST detection over a bounded sliding window.
//!
//! The detector keeps a growing window of recent samples and a small list of
//! in-progress beats. Every incoming sample is checked for R-peak candidacy
//! one position behind the window head (the one-sample lookahead gives a
//! reliable local maximum), then every open beat re-evaluates its missing
//! Q/S, P and T positions against the fixed search windows. Samples leave
//! the window once the trailing T-window can no longer reach them, which
//! bounds memory for arbitrarily long runs.

use tracing::{debug, trace};

use crate::config::{AcquisitionConfig, SampleRate};
use crate::data::{Sample, WaveType};

/// Search windows and thresholds, expressed in samples at the configured rate.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum voltage for an R-peak candidate.
    pub r_threshold: f64,
    /// Half-window searched for Q before R and S after R (80 ms).
    pub qs_window: usize,
    /// Window searched for P before Q (200 ms).
    pub p_window: usize,
    /// Window searched for T after S (400 ms).
    pub t_window: usize,
    /// Minimum distance between successive R detections (300 ms).
    pub refractory: usize,
}

const QS_WINDOW_SECONDS: f64 = 0.080;
const P_WINDOW_SECONDS: f64 = 0.200;
const T_WINDOW_SECONDS: f64 = 0.400;
const REFRACTORY_SECONDS: f64 = 0.300;

impl DetectorConfig {
    /// Derive the sample-domain windows from a rate and an R threshold.
    pub fn from_rate(rate: SampleRate, r_threshold: f64) -> Self {
        let hz = f64::from(rate.hz());
        Self {
            r_threshold,
            qs_window: (QS_WINDOW_SECONDS * hz).round() as usize,
            p_window: (P_WINDOW_SECONDS * hz).round() as usize,
            t_window: (T_WINDOW_SECONDS * hz).round() as usize,
            refractory: (REFRACTORY_SECONDS * hz).round() as usize,
        }
    }

    /// Derive the windows from the acquisition configuration.
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::from_rate(config.sample_rate, config.r_threshold)
    }
}

/// An in-progress heartbeat anchored at its R peak.
///
/// Positions are indices into the detector's current window and are shifted
/// down whenever the window is trimmed. Q and S complete together; P and T
/// complete independently once their windows have fully materialized.
#[derive(Debug, Clone)]
struct Beat {
    r: usize,
    qrs: Option<(usize, usize)>,
    p: Option<usize>,
    t: Option<usize>,
}

impl Beat {
    fn new(r: usize) -> Self {
        Self {
            r,
            qrs: None,
            p: None,
            t: None,
        }
    }

    /// Whether the beat can gain no further tags.
    ///
    /// A beat with its Q window truncated at the start of the stream can
    /// never complete the QRS complex; a completed beat is settled once T is
    /// placed and P is either placed or out of reach.
    fn settled(&self, config: &DetectorConfig) -> bool {
        match self.qrs {
            Some((q, _)) => self.t.is_some() && (self.p.is_some() || q < config.p_window),
            None => self.r < config.qs_window,
        }
    }

    /// Shift all positions down by `amount` after a window trim.
    ///
    /// Returns `false` if any position would fall off the front of the
    /// window, which retires the beat.
    fn shift_down(&mut self, amount: usize) -> bool {
        let Some(r) = self.r.checked_sub(amount) else {
            return false;
        };
        let qrs = match self.qrs {
            None => None,
            Some((q, s)) => match (q.checked_sub(amount), s.checked_sub(amount)) {
                (Some(q), Some(s)) => Some((q, s)),
                _ => return false,
            },
        };
        let p = match self.p {
            None => None,
            Some(p) => match p.checked_sub(amount) {
                Some(p) => Some(p),
                None => return false,
            },
        };
        let t = match self.t {
            None => None,
            Some(t) => match t.checked_sub(amount) {
                Some(t) => Some(t),
                None => return false,
            },
        };
        self.r = r;
        self.qrs = qrs;
        self.p = p;
        self.t = t;
        true
    }
}

/// Streaming PQRST detector.
///
/// Pure and deterministic: feeding the same sample stream into two
/// independent instances produces identical classified output. The detector
/// never fails; beats whose completion windows never materialize are flushed
/// with only their partial tags set.
pub struct BeatDetector {
    config: DetectorConfig,
    samples: Vec<Sample>,
    beats: Vec<Beat>,
    last_transferred: usize,
    /// Count of samples pushed since construction; `total_pushed -
    /// samples.len()` is the absolute index of the window start.
    total_pushed: u64,
    /// Absolute index of the most recent R detection, for the refractory
    /// check across window trims.
    last_r: Option<u64>,
    beats_detected: u64,
}

impl BeatDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let window_hint = config.t_window * 2 + 2;
        Self {
            config,
            samples: Vec::with_capacity(window_hint),
            beats: Vec::with_capacity(8),
            last_transferred: 0,
            total_pushed: 0,
            last_r: None,
            beats_detected: 0,
        }
    }

    /// Total number of R peaks detected so far.
    pub fn beats_detected(&self) -> u64 {
        self.beats_detected
    }

    /// Process one sample and return any samples whose classification is now
    /// final, in stream order.
    pub fn push(&mut self, sample: Sample) -> Vec<Sample> {
        self.samples.push(sample);
        self.total_pushed += 1;
        if self.samples.len() >= 3 {
            self.detect_r();
        }
        self.complete_beats();
        self.flush()
    }

    /// Finalize after the input is exhausted: run completion one last time
    /// and hand back everything still held, without trimming.
    pub fn finish(&mut self) -> Vec<Sample> {
        self.complete_beats();
        let out = self.samples[self.last_transferred..].to_vec();
        self.last_transferred = self.samples.len();
        out
    }

    /// Evaluate R candidacy one position behind the window head.
    fn detect_r(&mut self) {
        let pos = self.samples.len() - 2;
        let prev = self.samples[pos - 1].voltage;
        let curr = self.samples[pos].voltage;
        let next = self.samples[pos + 1].voltage;

        let is_peak = curr > prev && curr > next && curr > self.config.r_threshold;
        if !is_peak {
            return;
        }

        let absolute = self.absolute(pos);
        if let Some(last_r) = self.last_r {
            if absolute - last_r < self.config.refractory as u64 {
                trace!(position = pos, "R candidate inside refractory period");
                return;
            }
        }

        self.tag(pos, WaveType::R);
        self.beats.push(Beat::new(pos));
        self.last_r = Some(absolute);
        self.beats_detected += 1;
        debug!(position = pos, voltage = curr, "R peak detected");
    }

    /// Attempt to fill the missing positions of every open beat.
    fn complete_beats(&mut self) {
        let qs = self.config.qs_window;
        let p_window = self.config.p_window;
        let t_window = self.config.t_window;

        for i in 0..self.beats.len() {
            let r = self.beats[i].r;

            if self.beats[i].qrs.is_none() && r >= qs && r + qs < self.samples.len() {
                let q = self.lowest_between(r - qs, r - 1);
                let s = self.lowest_between(r + 1, r + qs);
                self.beats[i].qrs = Some((q, s));
                self.tag(q, WaveType::Q);
                self.tag(s, WaveType::S);
                debug!(r, q, s, "QRS complex completed");
            }

            if let Some((q, s)) = self.beats[i].qrs {
                if self.beats[i].p.is_none() && q >= p_window {
                    let p = self.highest_between(q - p_window, q - 1);
                    self.beats[i].p = Some(p);
                    self.tag(p, WaveType::P);
                    debug!(r, p, "P wave completed");
                }
                if self.beats[i].t.is_none() && s + t_window < self.samples.len() {
                    let t = self.highest_between(s + 1, s + t_window);
                    self.beats[i].t = Some(t);
                    self.tag(t, WaveType::T);
                    debug!(r, t, "T wave completed");
                }
            }
        }

        let config = &self.config;
        self.beats.retain(|beat| !beat.settled(config));
    }

    /// Hand over the prefix whose classifications can no longer change and
    /// trim the window to keep the trailing T-window in hand.
    fn flush(&mut self) -> Vec<Sample> {
        let t_window = self.config.t_window;
        if self.samples.len() <= t_window {
            return Vec::new();
        }

        let safe = self.samples.len() - t_window;
        if safe <= self.last_transferred {
            return Vec::new();
        }

        let out = self.samples[self.last_transferred..safe].to_vec();
        self.last_transferred = safe;

        if self.last_transferred > t_window {
            let remove = self.last_transferred - t_window;
            self.samples.drain(..remove);
            self.last_transferred = t_window;
            self.beats.retain_mut(|beat| {
                let kept = beat.shift_down(remove);
                if !kept {
                    debug!(r = beat.r, "beat trimmed out of the window");
                }
                kept
            });
        }

        out
    }

    /// Assign a tag. R replaces anything; the other waves only claim
    /// still-unclassified samples, so a classification transitions at most
    /// once and R dominates where positions collide.
    fn tag(&mut self, pos: usize, wave: WaveType) {
        let slot = &mut self.samples[pos].wave;
        if wave == WaveType::R || *slot == WaveType::Normal {
            *slot = wave;
        }
    }

    /// Index of the minimum voltage over the inclusive range, earliest wins.
    fn lowest_between(&self, start: usize, end: usize) -> usize {
        let mut best = start;
        for i in start + 1..=end {
            if self.samples[i].voltage < self.samples[best].voltage {
                best = i;
            }
        }
        best
    }

    /// Index of the maximum voltage over the inclusive range, earliest wins.
    fn highest_between(&self, start: usize, end: usize) -> usize {
        let mut best = start;
        for i in start + 1..=end {
            if self.samples[i].voltage > self.samples[best].voltage {
                best = i;
            }
        }
        best
    }

    fn absolute(&self, pos: usize) -> u64 {
        self.total_pushed - self.samples.len() as u64 + pos as u64
    }
}
