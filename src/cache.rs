//! Time-bounded result cache owned by the engine.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::{ClassSummary, GradebookEntry};

/// Invalidation count observed before a read starts. A result computed under
/// an older generation is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug)]
struct Slots<K, V> {
    generation: u64,
    entries: HashMap<K, (Instant, V)>,
}

#[derive(Debug)]
struct TtlMap<K, V> {
    ttl: Duration,
    slots: Mutex<Slots<K, V>>,
}

impl<K: Eq + Hash, V: Clone> TtlMap<K, V> {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(Slots {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    fn generation(&self) -> Generation {
        Generation(self.slots.lock().generation)
    }

    fn get(&self, key: &K) -> Option<V> {
        let mut slots = self.slots.lock();
        let expired = match slots.entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                return Some(value.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            slots.entries.remove(key);
        }
        None
    }

    fn insert(&self, key: K, value: V, seen: Generation) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        let mut slots = self.slots.lock();
        if slots.generation != seen.0 {
            return;
        }
        slots
            .entries
            .retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        slots.entries.insert(key, (Instant::now(), value));
    }

    fn invalidate(&self, mut matches: impl FnMut(&K) -> bool) {
        let mut slots = self.slots.lock();
        slots.generation = slots.generation.wrapping_add(1);
        slots.entries.retain(|key, _| !matches(key));
    }

    fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }
}

/// `period_number` is `None` when every period of the class was requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentKey {
    pub email: String,
    pub class_code: String,
    pub period_number: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassKey {
    pub class_code: String,
    pub period_number: i32,
}

/// Results keyed by student+period and class+period. Invalidation is always
/// explicit; nothing is refreshed behind the caller's back.
#[derive(Debug)]
pub struct GradebookCache {
    students: TtlMap<StudentKey, Vec<GradebookEntry>>,
    classes: TtlMap<ClassKey, Option<ClassSummary>>,
}

impl GradebookCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            students: TtlMap::new(ttl),
            classes: TtlMap::new(ttl),
        }
    }

    pub fn student(&self, key: &StudentKey) -> Option<Vec<GradebookEntry>> {
        self.students.get(key)
    }

    pub fn student_generation(&self) -> Generation {
        self.students.generation()
    }

    /// Stores `entries` unless a student invalidation happened after `seen`.
    pub fn store_student(&self, key: StudentKey, entries: Vec<GradebookEntry>, seen: Generation) {
        self.students.insert(key, entries, seen);
    }

    pub fn class(&self, key: &ClassKey) -> Option<Option<ClassSummary>> {
        self.classes.get(key)
    }

    pub fn class_generation(&self) -> Generation {
        self.classes.generation()
    }

    pub fn store_class(&self, key: ClassKey, summary: Option<ClassSummary>, seen: Generation) {
        self.classes.insert(key, summary, seen);
    }

    /// Drops the student's results for this period, including "all periods"
    /// lookups that contain it.
    pub fn invalidate_student_period(&self, email: &str, class_code: &str, period_number: i32) {
        self.students.invalidate(|key| {
            key.email == email
                && key.class_code == class_code
                && key.period_number.map_or(true, |n| n == period_number)
        });
    }

    pub fn invalidate_class_period(&self, class_code: &str, period_number: i32) {
        self.classes
            .invalidate(|key| key.class_code == class_code && key.period_number == period_number);
    }

    pub fn cached_results(&self) -> usize {
        self.students.len() + self.classes.len()
    }
}
