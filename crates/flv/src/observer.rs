/// Receiver for decoded NAL units, for auxiliary analysis.
///
/// The demuxer hands every emitted unit (4-byte Annex-B start code plus the
/// NAL bytes) to the observer together with the owning tag's combined
/// timestamp. Fire and forget: nothing the observer does can influence
/// parsing.
pub trait NalUnitObserver {
    /// Called once per decoded NAL unit, in stream order.
    fn on_nal_unit(&mut self, unit: &[u8], timestamp_ms: u32);
}
