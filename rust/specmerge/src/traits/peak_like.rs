use crate::models::RawPeak;

/// Anything that can be folded into a merged peak list.
///
/// Raw peaks are their own (single) source, merged peaks expose
/// every raw peak that contributed to them.
pub trait PeakLike {
    fn mz(&self) -> f64;
    fn intensity(&self) -> f64;
    fn sources(&self) -> &[RawPeak];
}

impl PeakLike for RawPeak {
    fn mz(&self) -> f64 {
        self.mz
    }

    fn intensity(&self) -> f64 {
        self.intensity
    }

    fn sources(&self) -> &[RawPeak] {
        std::slice::from_ref(self)
    }
}
