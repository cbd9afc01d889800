/// Stage of a sweep, as reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStage {
    ApplyingModels,
    Configuring,
    Iterating,
    Sampling,
    PointCompleted,
    PointFailed,
    Completed,
}

impl SweepStage {
    pub fn label(&self) -> &'static str {
        match self {
            SweepStage::ApplyingModels => "models",
            SweepStage::Configuring => "configure",
            SweepStage::Iterating => "iterate",
            SweepStage::Sampling => "sample",
            SweepStage::PointCompleted => "done",
            SweepStage::PointFailed => "failed",
            SweepStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepProgressEvent {
    pub stage: SweepStage,
    /// 0-based index of the current point, if the stage concerns one.
    pub point_index: Option<usize>,
    pub total_points: usize,
    pub completed: usize,
    pub failed: usize,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl SweepProgressEvent {
    /// Fraction of points finished (completed or failed).
    pub fn fraction_complete(&self) -> f64 {
        if self.total_points == 0 {
            return 1.0;
        }
        (self.completed + self.failed) as f64 / self.total_points as f64
    }
}
