//! Configuration of encoders and decoders.

const DEFAULT_INITIAL_CAPACITY: usize = 512;

/// Settings of a stream, build them with a [`StreamOptionsBuilder`]
///
/// [`StreamOptionsBuilder`]: struct.StreamOptionsBuilder.html
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    pub(crate) initial_capacity: usize,
    pub(crate) max_points: Option<u32>,
}

impl StreamOptions {
    /// Number of bytes allocated for the buffer before it first needs to grow
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Maximum number of points a stream may register, `None` for no limit
    pub fn max_points(&self) -> Option<u32> {
        self.max_points
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_points: None,
        }
    }
}

/// Builder of [`StreamOptions`]
///
/// ```
/// use measurement_stream::StreamOptionsBuilder;
///
/// let options = StreamOptionsBuilder::new()
///     .with_initial_capacity(4096)
///     .with_max_points(10_000)
///     .build();
/// assert_eq!(options.max_points(), Some(10_000));
/// ```
///
/// [`StreamOptions`]: struct.StreamOptions.html
#[derive(Debug, Default, Copy, Clone)]
pub struct StreamOptionsBuilder {
    options: StreamOptions,
}

impl StreamOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.options.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_points(mut self, max_points: u32) -> Self {
        self.options.max_points = Some(max_points);
        self
    }

    pub fn build(self) -> StreamOptions {
        self.options
    }
}
