//! Synthetic summary-file directories for integration tests.

#![allow(dead_code)]
// Each test binary uses a different subset of these helpers.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use sp_common::Host;
use tempfile::TempDir;

/// Physical row plus per-column control baseline for one summary file.
///
/// Controls alternate `random ± spread` so each column has control mean
/// `random` and population std `spread` (for an even control count).
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    pub physical: [f64; 8],
    pub random: f64,
    pub spread: f64,
}

impl GroupSpec {
    /// Every column physical = `value`, controls `0 ± 1`.
    pub fn uniform(value: f64) -> Self {
        GroupSpec {
            physical: [value; 8],
            random: 0.0,
            spread: 1.0,
        }
    }

    /// Distinct physical values for width (col 6), ca_ratio (col 2) and
    /// ba_ratio (col 3); controls `0 ± 1` so normalized values equal these.
    pub fn fields(width: f64, ca_ratio: f64, ba_ratio: f64) -> Self {
        GroupSpec {
            physical: [0.0, 0.0, ca_ratio, ba_ratio, 1.0, 0.0, width, 0.5],
            random: 0.0,
            spread: 1.0,
        }
    }

    fn render(&self, n_controls: usize) -> String {
        let mut body = String::from("# minr maxr ca_ratio ba_ratio a center width mu\n");
        let _ = writeln!(body, "{}", join(&self.physical));
        for i in 0..n_controls {
            let v = if i % 2 == 0 {
                self.random - self.spread
            } else {
                self.random + self.spread
            };
            let _ = writeln!(body, "{}", join(&[v; 8]));
        }
        body
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A temporary data directory.
pub struct DataDir {
    dir: TempDir,
    pub n_controls: usize,
}

impl DataDir {
    pub fn new(n_controls: usize) -> Self {
        DataDir {
            dir: TempDir::new().expect("create temp dir"),
            n_controls,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_path(&self, host: Host, group_id: u64, n_sat: u32) -> PathBuf {
        self.path()
            .join(format!("{}_group_{}_nsat_{}.dat", host.label(), group_id, n_sat))
    }

    /// Write one host's file.
    pub fn write(&self, host: Host, group_id: u64, n_sat: u32, spec: GroupSpec) -> PathBuf {
        let path = self.file_path(host, group_id, n_sat);
        fs::write(&path, spec.render(self.n_controls)).expect("write summary file");
        path
    }

    /// Write both hosts; MW gets the negated physical row.
    pub fn write_pair(&self, group_id: u64, n_sat: u32, spec: GroupSpec) {
        self.write(Host::M31, group_id, n_sat, spec);
        let mut mw = spec;
        for v in mw.physical.iter_mut() {
            *v = -*v;
        }
        self.write(Host::Mw, group_id, n_sat, mw);
    }

    /// A simulation-like directory with `n` groups of varied fields.
    pub fn simulation(n_controls: usize, n_sat: u32, n: u64) -> Self {
        let data = DataDir::new(n_controls);
        for g in 0..n {
            let x = g as f64;
            data.write_pair(
                100 + g,
                n_sat,
                GroupSpec::fields(0.5 + x, 1.0 + (x * 1.7).sin(), 2.0 - 0.3 * x * x),
            );
        }
        data
    }

    /// An observation directory with a single group.
    pub fn observation(n_controls: usize, n_sat: u32) -> Self {
        let data = DataDir::new(n_controls);
        data.write_pair(0, n_sat, GroupSpec::fields(1.5, 0.8, 1.2));
        data
    }

    /// Write an analysis config in this directory.
    pub fn write_config(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, body).expect("write config");
        path
    }
}
