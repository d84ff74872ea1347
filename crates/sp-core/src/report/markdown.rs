//! Plain Markdown tables for report payloads.

use super::{
    CovarianceReport, Envelope, GaussianComparison, NormalizedDependence, ObservationReport,
    ObservationShape, SimulationShape,
};
use crate::jackknife::JackknifeView;

/// Render as Markdown.
pub trait ToMarkdown {
    fn to_markdown(&self) -> String;
}

impl<T: ToMarkdown> ToMarkdown for Envelope<T> {
    fn to_markdown(&self) -> String {
        let mut out = format!("# satplane {}\n\n", self.command);
        out.push_str(&format!(
            "Run: `{}`  \nConfig: `{}`  \nGenerated: {}\n\n",
            self.run_id,
            short_hash(&self.config_hash),
            self.generated_at.to_rfc3339()
        ));
        out.push_str(&self.report.to_markdown());
        out
    }
}

impl<T: ToMarkdown> ToMarkdown for Vec<T> {
    fn to_markdown(&self) -> String {
        if self.is_empty() {
            return "_No satellite counts with groups._\n".to_string();
        }
        self.iter()
            .map(ToMarkdown::to_markdown)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ToMarkdown for ObservationReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("## n_sat = {} ({:?})\n\n", self.n_sat, self.mode);
        for host in &self.hosts {
            out.push_str(&format!("### {} ({} groups)\n\n", host.host, host.group_ids.len()));
            if host.group_ids.is_empty() {
                out.push_str("_No groups._\n\n");
                continue;
            }
            out.push_str("| series | ");
            out.push_str(&join_cells(host.group_ids.iter().map(|g| format!("group {}", g))));
            out.push_str(" |\n");
            out.push_str(&separator(host.group_ids.len() + 1));
            for (name, values) in &host.series {
                out.push_str(&format!("| {} | {} |\n", name, join_cells(values.iter().map(num))));
            }
            if let Some(normalized) = &host.normalized {
                out.push_str("\nNormalized:\n\n| field | ");
                out.push_str(&join_cells(host.group_ids.iter().map(|g| format!("group {}", g))));
                out.push_str(" |\n");
                out.push_str(&separator(host.group_ids.len() + 1));
                for (field, row) in normalized.fields.iter().zip(&normalized.rows) {
                    out.push_str(&format!("| {} | {} |\n", field, join_cells(row.iter().map(num))));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl ToMarkdown for ObservationShape {
    fn to_markdown(&self) -> String {
        let mut out = format!("## Observations, n_sat = {}\n\n", self.n_sat);
        out.push_str("| field | host | physical | random | normalized |\n");
        out.push_str(&separator(5));
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} | {} ± {} | {} |\n",
                row.field.label(),
                row.host,
                num(&row.physical),
                num(&row.random),
                num(&row.random_sigma),
                num(&row.normalized)
            ));
        }
        out
    }
}

impl ToMarkdown for SimulationShape {
    fn to_markdown(&self) -> String {
        let mut out = format!("## Simulations, n_sat = {}\n\n", self.n_sat);
        out.push_str("| source | host | field | groups | mean ± std |\n");
        out.push_str(&separator(5));
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} ± {} |\n",
                row.source,
                row.host,
                row.field.label(),
                row.groups,
                num(&row.mean),
                num(&row.std)
            ));
        }
        out
    }
}

impl ToMarkdown for NormalizedDependence {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## Normalized {} (field {}) vs n_sat\n\n",
            self.field.label(),
            self.field_index
        );
        out.push_str("| n_sat | M31 | MW |\n");
        out.push_str(&separator(3));
        for p in &self.points {
            out.push_str(&format!("| {} | {} | {} |\n", p.n_sat, num(&p.m31), num(&p.mw)));
        }
        out
    }
}

impl ToMarkdown for CovarianceReport {
    fn to_markdown(&self) -> String {
        let mut out = format!("## Jackknife covariance, n_sat = {}\n\n", self.n_sat);
        for host in &self.hosts {
            out.push_str(&format!("### {}\n\n", host.host));
            out.push_str(&estimate_tables(&host.estimate));
        }
        out
    }
}

impl ToMarkdown for GaussianComparison {
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## Gaussian model `{}`, n_sat = {}\n\nSamples: {}",
            self.simulation, self.n_sat, self.sample_count
        );
        if let Some(seed) = self.seed {
            out.push_str(&format!(" (seed {})", seed));
        }
        out.push_str("\n\n");

        for host in &self.hosts {
            out.push_str(&format!("### {}\n\n", host.host));
            out.push_str(&estimate_tables(&host.estimate));

            let qs = host
                .comparison
                .fields
                .first()
                .map(|f| f.quantiles.iter().map(|q| format!("q{}", q.q)).collect::<Vec<_>>())
                .unwrap_or_default();
            out.push_str("\n| field | observed | sample mean ± std | ");
            out.push_str(&join_cells(qs.iter().cloned()));
            out.push_str(" | P(draw ≤ observed) |\n");
            out.push_str(&separator(qs.len() + 4));
            for f in &host.comparison.fields {
                let name = f
                    .field
                    .map(|o| o.to_string())
                    .unwrap_or_else(|| f.index.to_string());
                out.push_str(&format!(
                    "| {} | {} | {} ± {} | {} | {} |\n",
                    name,
                    num(&f.reference),
                    num(&f.sample_mean),
                    num(&f.sample_std),
                    join_cells(f.quantiles.iter().map(|q| num(&q.value))),
                    num(&f.fraction_at_or_below)
                ));
            }
            if host.comparison.jitter > 0.0 {
                out.push_str(&format!("\nDiagonal jitter: {:e}\n", host.comparison.jitter));
            }
            out.push('\n');
        }
        out
    }
}

fn estimate_tables(est: &JackknifeView) -> String {
    let mut out = format!(
        "Groups: {}, mean error divisor: {} ({})\n\n",
        est.n_groups, est.mean_error_divisor, est.divisor_policy
    );
    out.push_str("| field | mean | ");
    out.push_str(&join_cells(est.fields.iter().map(|f| f.to_string())));
    out.push_str(" |\n");
    out.push_str(&separator(est.fields.len() + 2));
    for (i, field) in est.fields.iter().enumerate() {
        let cells = (0..est.fields.len()).map(|j| {
            format!(
                "{} ± {}",
                num(&est.covariance[i][j]),
                num(&est.covariance_error[i][j])
            )
        });
        out.push_str(&format!(
            "| {} | {} ± {} | {} |\n",
            field,
            num(&est.mean[i]),
            num(&est.mean_error[i]),
            join_cells(cells)
        ));
    }
    out
}

fn num(v: &f64) -> String {
    format!("{:.3}", v)
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join(" | ")
}

fn separator(columns: usize) -> String {
    format!("|{}\n", "---|".repeat(columns))
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
