use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

/// Shared compact-response switch.
///
/// Clones observe the same flag. A request reads it once when it starts rendering, so a toggle
/// never changes a response that is already being built.
#[derive(Clone, Debug, Default)]
pub struct ModeController {
	endless: Arc<AtomicBool>,
}
impl ModeController {
	pub fn new(enabled: bool) -> Self {
		Self { endless: Arc::new(AtomicBool::new(enabled)) }
	}

	/// Returns the previous value.
	pub fn set(&self, enabled: bool) -> bool {
		self.endless.swap(enabled, Ordering::SeqCst)
	}

	pub fn get(&self) -> bool {
		self.endless.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_state() {
		let mode = ModeController::default();
		let other = mode.clone();

		assert!(!mode.get());
		assert!(!other.set(true));
		assert!(mode.get());
		assert!(mode.set(false));
		assert!(!other.get());
	}
}
