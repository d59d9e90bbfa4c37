//! Viewport parsing and filter construction for catalog reads
//!
//! A list query is described by an optional viewport and an optional role.
//! Both are validated here, before any backend sees them, so that malformed
//! input never turns into a partial or best-effort query.
//!
//! Containment is planar: a point matches when it lies inside the closed
//! rectangle spanned by the lower-left `(min_lng, min_lat)` and upper-right
//! `(max_lng, max_lat)` corners. Boxes crossing the antimeridian or covering
//! the poles are not handled specially.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    #[error("bbox must have exactly 4 comma-separated components, got {0}")]
    ComponentCount(usize),
    #[error("bbox component {index} ('{value}') is not a number")]
    NotNumeric { index: usize, value: String },
    #[error("bbox component {index} ('{value}') is not finite")]
    NotFinite { index: usize, value: String },
}

/// Axis-aligned longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Viewport {
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// True when the lower-left corner lies beyond the upper-right corner on
    /// either axis. Such a box contains no point.
    pub fn is_inverted(&self) -> bool {
        self.min_lng > self.max_lng || self.min_lat > self.max_lat
    }

    /// Closed planar containment test, mirroring what the stores evaluate.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl FromStr for Viewport {
    type Err = ViewportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ViewportError::ComponentCount(parts.len()));
        }

        let mut values = [0.0f64; 4];
        for (index, (slot, raw)) in values.iter_mut().zip(&parts).enumerate() {
            let value = raw.parse::<f64>().map_err(|_| ViewportError::NotNumeric {
                index,
                value: raw.to_string(),
            })?;
            // "NaN" and "inf" parse as f64 but cannot describe a box
            if !value.is_finite() {
                return Err(ViewportError::NotFinite {
                    index,
                    value: raw.to_string(),
                });
            }
            *slot = value;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}

/// Validated filter for a catalog list query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub viewport: Option<Viewport>,
    pub role: Option<String>,
}

impl CatalogFilter {
    /// Build a filter from raw request parameters.
    ///
    /// Blank parameters count as absent. A present `bbox` must parse into a
    /// [`Viewport`]; the role is kept verbatim and later compared exactly.
    pub fn from_params(bbox: Option<&str>, role: Option<&str>) -> Result<Self, ViewportError> {
        let viewport = match bbox.filter(|b| !b.trim().is_empty()) {
            Some(raw) => Some(raw.parse::<Viewport>()?),
            None => None,
        };
        let role = role.filter(|r| !r.is_empty()).map(str::to_string);

        Ok(Self { viewport, role })
    }

    /// True when the filter cannot match any camera, so the store does not
    /// need to be consulted.
    pub fn matches_nothing(&self) -> bool {
        self.viewport.is_some_and(|v| v.is_inverted())
    }

    /// Stable key identifying this filter, used by the read cache.
    pub fn cache_key(&self) -> String {
        let viewport = self
            .viewport
            .map(|v| v.to_string())
            .unwrap_or_default();
        let role = self.role.as_deref().unwrap_or_default();
        format!("bbox={viewport}|role={role}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        let vp: Viewport = "0,0,20,30".parse().unwrap();
        assert_eq!(vp, Viewport::new(0.0, 0.0, 20.0, 30.0));
    }

    #[test]
    fn test_parse_viewport_trims_whitespace_and_accepts_negatives() {
        let vp: Viewport = " -122.5, 37.2 ,-121.9,  37.9 ".parse().unwrap();
        assert_eq!(vp, Viewport::new(-122.5, 37.2, -121.9, 37.9));
    }

    #[test]
    fn test_parse_viewport_wrong_component_count() {
        assert_eq!(
            "1,2,3".parse::<Viewport>(),
            Err(ViewportError::ComponentCount(3))
        );
        assert_eq!(
            "1,2,3,4,5".parse::<Viewport>(),
            Err(ViewportError::ComponentCount(5))
        );
        assert_eq!(
            "1,2,3,4,".parse::<Viewport>(),
            Err(ViewportError::ComponentCount(5))
        );
    }

    #[test]
    fn test_parse_viewport_non_numeric() {
        let err = "0,abc,20,30".parse::<Viewport>().unwrap_err();
        assert_eq!(
            err,
            ViewportError::NotNumeric {
                index: 1,
                value: "abc".to_string()
            }
        );

        assert!(matches!(
            "0,,20,30".parse::<Viewport>(),
            Err(ViewportError::NotNumeric { index: 1, .. })
        ));
    }

    #[test]
    fn test_parse_viewport_rejects_non_finite() {
        assert!(matches!(
            "NaN,0,20,30".parse::<Viewport>(),
            Err(ViewportError::NotFinite { index: 0, .. })
        ));
        assert!(matches!(
            "0,0,inf,30".parse::<Viewport>(),
            Err(ViewportError::NotFinite { index: 2, .. })
        ));
    }

    #[test]
    fn test_contains_is_closed() {
        let vp = Viewport::new(0.0, 0.0, 20.0, 30.0);
        assert!(vp.contains(10.0, 20.0));
        assert!(vp.contains(0.0, 0.0));
        assert!(vp.contains(20.0, 30.0));
        assert!(vp.contains(0.0, 30.0));
        assert!(!vp.contains(20.000001, 15.0));
        assert!(!vp.contains(-0.000001, 15.0));
        assert!(!vp.contains(50.0, 60.0));
    }

    #[test]
    fn test_inverted_viewport_contains_nothing() {
        let vp = Viewport::new(20.0, 0.0, 0.0, 30.0);
        assert!(vp.is_inverted());
        assert!(!vp.contains(10.0, 20.0));

        let degenerate = Viewport::new(10.0, 20.0, 10.0, 20.0);
        assert!(!degenerate.is_inverted());
        assert!(degenerate.contains(10.0, 20.0));
    }

    #[test]
    fn test_filter_from_params() {
        let filter = CatalogFilter::from_params(Some("0,0,20,30"), Some("traffic")).unwrap();
        assert_eq!(filter.viewport, Some(Viewport::new(0.0, 0.0, 20.0, 30.0)));
        assert_eq!(filter.role.as_deref(), Some("traffic"));

        let empty = CatalogFilter::from_params(None, None).unwrap();
        assert_eq!(empty, CatalogFilter::default());

        let blank = CatalogFilter::from_params(Some("  "), Some("")).unwrap();
        assert_eq!(blank, CatalogFilter::default());

        assert!(CatalogFilter::from_params(Some("0,0,20"), Some("traffic")).is_err());
    }

    #[test]
    fn test_filter_matches_nothing_only_for_inverted_boxes() {
        let inverted = CatalogFilter::from_params(Some("20,0,0,30"), None).unwrap();
        assert!(inverted.matches_nothing());

        let normal = CatalogFilter::from_params(Some("0,0,20,30"), None).unwrap();
        assert!(!normal.matches_nothing());
        assert!(!CatalogFilter::default().matches_nothing());
    }

    #[test]
    fn test_cache_key_distinguishes_filters() {
        let a = CatalogFilter::from_params(Some("0,0,20,30"), None).unwrap();
        let b = CatalogFilter::from_params(Some("0,0,20,30"), Some("traffic")).unwrap();
        let c = CatalogFilter::from_params(None, Some("traffic")).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(b.cache_key(), c.cache_key());
        assert_eq!(
            a.cache_key(),
            CatalogFilter::from_params(Some("0, 0, 20, 30"), None)
                .unwrap()
                .cache_key()
        );
    }
}
