/// One resolution level: the raw feed or an N-to-1 downsample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Raw,
    Agg(u32),
}

impl ResolutionTier {
    /// Downsampling factor; 1 for the raw tier.
    pub fn factor(self) -> u32 {
        match self {
            Self::Raw => 1,
            Self::Agg(f) => f,
        }
    }
}

/// A selectable tier with the minimum pixels-per-data-unit it needs.
#[derive(Debug, Clone, Copy)]
pub struct TierThreshold {
    pub factor: u32,
    pub min_ppdu: f64,
}

/// Tier table plus hysteresis margin. Tiers are ordered finest (raw) to
/// coarsest; the last tier's threshold is the catch-all floor.
#[derive(Debug, Clone)]
pub struct ResolutionPolicyConfig {
    pub tiers: Vec<TierThreshold>,
    /// Fractional margin a switch must clear, keeping the tier stable when
    /// ppdu hovers at a boundary.
    pub hysteresis: f64,
}

impl Default for ResolutionPolicyConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierThreshold { factor: 1, min_ppdu: 6.0 },
                TierThreshold { factor: 2, min_ppdu: 3.0 },
                TierThreshold { factor: 4, min_ppdu: 1.5 },
                TierThreshold { factor: 8, min_ppdu: 0.0 },
            ],
            hysteresis: 0.05,
        }
    }
}

/// Hysteresis-bounded tier selector driven by pixels-per-data-unit.
///
/// Picks the finest tier whose threshold the signal satisfies; an actual
/// switch additionally requires the signal to clear the boundary by the
/// hysteresis margin. Starts at the finest tier.
#[derive(Debug)]
pub struct ResolutionController {
    config: ResolutionPolicyConfig,
    current: usize,
}

impl ResolutionController {
    pub fn new(config: ResolutionPolicyConfig) -> Self {
        assert!(!config.tiers.is_empty(), "tier table must not be empty");
        Self { config, current: 0 }
    }

    pub fn set_config(&mut self, config: ResolutionPolicyConfig) {
        assert!(!config.tiers.is_empty(), "tier table must not be empty");
        self.config = config;
        self.current = 0;
    }

    /// Finest tier index satisfied by `ppdu`.
    fn select(&self, ppdu: f64) -> usize {
        self.config
            .tiers
            .iter()
            .position(|t| ppdu >= t.min_ppdu)
            .unwrap_or(self.config.tiers.len() - 1)
    }

    /// Re-evaluate against a new signal. Returns true iff the tier changed.
    pub fn evaluate(&mut self, ppdu: f64) -> bool {
        let candidate = self.select(ppdu);
        if candidate == self.current {
            return false;
        }
        let h = self.config.hysteresis;
        if candidate < self.current {
            // Moving finer: the candidate threshold must be cleared with margin.
            if ppdu < self.config.tiers[candidate].min_ppdu * (1.0 + h) {
                return false;
            }
        } else {
            // Moving coarser: must fall clearly below the current threshold.
            if ppdu >= self.config.tiers[self.current].min_ppdu * (1.0 - h) {
                return false;
            }
        }
        log::debug!(
            "resolution tier switch: factor {} -> {} (ppdu {:.3})",
            self.config.tiers[self.current].factor,
            self.config.tiers[candidate].factor,
            ppdu
        );
        self.current = candidate;
        true
    }

    pub fn tier(&self) -> ResolutionTier {
        match self.config.tiers[self.current].factor {
            1 => ResolutionTier::Raw,
            f => ResolutionTier::Agg(f),
        }
    }

    pub fn factor(&self) -> u32 {
        self.config.tiers[self.current].factor
    }
}

impl Default for ResolutionController {
    fn default() -> Self {
        Self::new(ResolutionPolicyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_raw() {
        let ctrl = ResolutionController::default();
        assert_eq!(ctrl.tier(), ResolutionTier::Raw);
        assert_eq!(ctrl.factor(), 1);
    }

    #[test]
    fn zoom_out_selects_coarser_tier() {
        let mut ctrl = ResolutionController::default();
        assert!(!ctrl.evaluate(20.0)); // plenty of pixels: stay raw
        assert!(ctrl.evaluate(4.0)); // crosses below 6 with margin
        assert_eq!(ctrl.tier(), ResolutionTier::Agg(2));
        assert!(ctrl.evaluate(0.5));
        assert_eq!(ctrl.tier(), ResolutionTier::Agg(8));
    }

    #[test]
    fn zoom_in_returns_to_raw() {
        let mut ctrl = ResolutionController::default();
        ctrl.evaluate(4.0);
        assert_eq!(ctrl.factor(), 2);
        assert!(ctrl.evaluate(20.0));
        assert_eq!(ctrl.tier(), ResolutionTier::Raw);
    }

    #[test]
    fn hysteresis_holds_near_the_boundary() {
        let mut ctrl = ResolutionController::default();
        // Just below the raw threshold but within the 5% band: no switch.
        assert!(!ctrl.evaluate(5.9));
        assert_eq!(ctrl.tier(), ResolutionTier::Raw);
        // Clearly below: switch.
        assert!(ctrl.evaluate(5.0));
        assert_eq!(ctrl.tier(), ResolutionTier::Agg(2));
        // Back just above the raw threshold, inside the band: hold.
        assert!(!ctrl.evaluate(6.1));
        assert_eq!(ctrl.tier(), ResolutionTier::Agg(2));
        // Well above: switch back.
        assert!(ctrl.evaluate(6.5));
        assert_eq!(ctrl.tier(), ResolutionTier::Raw);
    }

    #[test]
    fn evaluate_reports_change_only_on_switch() {
        let mut ctrl = ResolutionController::default();
        assert!(ctrl.evaluate(2.0));
        assert!(!ctrl.evaluate(2.0));
        assert!(!ctrl.evaluate(2.2));
    }
}
