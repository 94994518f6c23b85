//! Constants used throughout the pipeline

/// Number of blendshape scores produced per detection
pub const N_SHAPES: usize = 52;

/// Number of landmarks in a full face mesh
pub const NUM_FACE_LANDMARKS: usize = 478;

/// Default number of blendshape frames retained for smoothing
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Blendshape slots overwritten with eye aspect ratio values
pub const EAR_RIGHT_SLOT: usize = 9;
pub const EAR_LEFT_SLOT: usize = 10;
pub const EAR_AVG_SLOT: usize = 11;

/// Right eye landmark quartet: horizontal pair, then vertical pair
pub const RIGHT_EYE_LANDMARKS: [usize; 4] = [362, 263, 386, 374];

/// Left eye landmark quartet: horizontal pair, then vertical pair
pub const LEFT_EYE_LANDMARKS: [usize; 4] = [33, 133, 159, 145];

/// Scale applied to vertical/horizontal eye distance ratio
pub const EAR_RATIO_SCALE: f64 = 3.0;

/// Gain applied to the rotated forward vector in head-pose mode
pub const DEFAULT_HEAD_POSE_GAIN: f64 = 0.3;

/// Default landmark used for landmark-average tracking
pub const DEFAULT_TRACKING_VERTEX: usize = 8;

/// Default screen size used when the configuration omits it
pub const DEFAULT_SCREEN_WIDTH: u32 = 1920;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1080;

/// Pipeline driver tick in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1;

/// Longest accepted tick interval
pub const MAX_TICK_INTERVAL_MS: u64 = 1000;

/// Ticks run after the last recorded detection during replay
pub const DEFAULT_REPLAY_TAIL_MS: u64 = 1000;

/// Longest accepted replay tail
pub const MAX_REPLAY_TAIL_MS: u64 = 60_000;

/// Default kernel window when no explicit weights are configured
pub const DEFAULT_SMOOTHING_WINDOW: usize = 8;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
