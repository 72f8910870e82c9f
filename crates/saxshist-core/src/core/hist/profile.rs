use super::error::ExportError;
use serde::Serialize;
use std::path::Path;

/// A scattering intensity curve, I(q) sampled on a q axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScatteringProfile {
    pub q: Vec<f64>,
    pub intensity: Vec<f64>,
}

#[derive(Serialize)]
struct ProfileRow {
    q: f64,
    intensity: f64,
}

impl ScatteringProfile {
    pub fn new(q: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self { q, intensity }
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    /// Iterates over `(q, I(q))` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.q.iter().copied().zip(self.intensity.iter().copied())
    }

    /// Returns a copy scaled so that the first point equals one.
    ///
    /// A profile whose first point is zero is returned unchanged.
    pub fn normalized(&self) -> Self {
        let first = self.intensity.first().copied().unwrap_or(0.0);
        if first == 0.0 {
            return self.clone();
        }
        Self {
            q: self.q.clone(),
            intensity: self.intensity.iter().map(|i| i / first).collect(),
        }
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        write_rows(
            path,
            self.iter().map(|(q, intensity)| ProfileRow { q, intensity }),
        )
    }
}

/// Serializes `rows` as a headed CSV file at `path`.
pub(crate) fn write_rows<T, I>(path: &Path, rows: I) -> Result<(), ExportError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path_str = || path.to_string_lossy().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|e| ExportError::Csv {
        path: path_str(),
        source: e,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| ExportError::Csv {
            path: path_str(),
            source: e,
        })?;
    }
    writer.flush().map_err(|e| ExportError::Io {
        path: path_str(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn write_csv_emits_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.csv");
        let profile = ScatteringProfile::new(vec![0.0, 0.5], vec![10.0, 2.5]);
        profile.write_csv(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["q,intensity", "0.0,10.0", "0.5,2.5"]);
    }

    #[test]
    fn write_csv_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("profile.csv");
        let profile = ScatteringProfile::new(vec![0.0], vec![1.0]);
        assert!(matches!(
            profile.write_csv(&path),
            Err(ExportError::Csv { .. })
        ));
    }

    #[test]
    fn normalized_scales_first_point_to_one() {
        let profile = ScatteringProfile::new(vec![0.0, 0.1], vec![4.0, 2.0]);
        assert_eq!(profile.normalized().intensity, vec![1.0, 0.5]);
        let zero = ScatteringProfile::new(vec![0.0], vec![0.0]);
        assert_eq!(zero.normalized(), zero);
    }
}
