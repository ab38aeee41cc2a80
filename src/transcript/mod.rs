//! # Transcript
//!
//! The printed lines are the whole point of the exercises: their order proves (or disproves)
//! the synchronization. The transcript keeps the lines in the order they were printed
//! so tests can look at them instead of parsing stdout.
//!
//! A demo that runs forever should only echo, a retained line is never freed.

use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct Transcript {
    lines: Mutex<Vec<String>>,
    echo: bool,
    retain: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::silent()
    }
}

impl Transcript {
    /// `with(false, false)` throws every line away
    pub fn with(echo: bool, retain: bool) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            echo,
            retain,
        }
    }

    /// prints every recorded line to stdout and keeps it
    pub fn new() -> Self {
        Self::with(true, true)
    }

    /// keeps only, for tests
    pub fn silent() -> Self {
        Self::with(false, true)
    }

    /// prints only, [Transcript::lines] stays empty
    pub fn echo_only() -> Self {
        Self::with(true, false)
    }

    pub fn record(&self, line: impl Into<String>) {
        let line = line.into();
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        // print under the lock => stdout order is the recorded order
        if self.echo {
            println!("{line}");
        }
        if self.retain {
            lines.push(line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use std::thread::scope;

    use super::*;

    #[test]
    fn test_keeps_all_lines() {
        let t = Transcript::silent();
        scope(|s| {
            for i in 0..4 {
                let t = &t;
                s.spawn(move || {
                    for j in 0..25 {
                        t.record(format!("{i}:{j}"));
                    }
                });
            }
        });
        let lines = t.lines();
        assert_eq!(lines.len(), 100);
        // each writer's own lines stay in its program order
        for i in 0..4 {
            let mine: Vec<String> = lines
                .iter()
                .filter(|l| l.starts_with(&format!("{i}:")))
                .cloned()
                .collect();
            let expected: Vec<String> = (0..25).map(|j| format!("{i}:{j}")).collect();
            assert_eq!(mine, expected);
        }
    }

    #[test]
    fn test_empty() {
        let t = Transcript::silent();
        assert!(t.is_empty());
        t.record("x");
        assert_eq!(t.lines(), vec!["x"]);
    }

    #[test]
    fn test_echo_only_keeps_nothing() {
        let t = Transcript::echo_only();
        for i in 0..1000 {
            t.record(format!("line {i}"));
        }
        assert!(t.is_empty());
        assert!(t.lines().is_empty());
    }
}
