use std::collections::VecDeque;
use std::time::Instant;

use crate::batch::RenderList;

/// Counters for one presented frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub render_lists: u32,
    pub draw_calls: u32,
    pub instances: u32,
    pub pipeline_switches: u32,
    /// Wall time from frame acquisition to present.
    pub cpu_frame_ms: f64,
}

pub struct MetricsCollector {
    current: FrameStats,
    frame_start: Option<Instant>,
    frames_presented: u64,

    history: VecDeque<FrameStats>,
    max_history: usize,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            current: FrameStats::default(),
            frame_start: None,
            frames_presented: 0,
            history: VecDeque::with_capacity(300),
            max_history: 300, // 5 seconds at 60 fps
        }
    }

    pub fn begin_frame(&mut self) {
        self.current = FrameStats {
            frame_index: self.frames_presented,
            ..FrameStats::default()
        };
        self.frame_start = Some(Instant::now());
    }

    pub fn record_render_list(&mut self, list: &RenderList) {
        let draws = u32::try_from(list.draws.len()).unwrap_or(u32::MAX);
        let instances = u32::try_from(list.instances.len()).unwrap_or(u32::MAX);
        let stats = &mut self.current;
        stats.render_lists = stats.render_lists.saturating_add(1);
        stats.draw_calls = stats.draw_calls.saturating_add(draws);
        stats.instances = stats.instances.saturating_add(instances);
        stats.pipeline_switches = stats.pipeline_switches.saturating_add(list.pipeline_switches());
    }

    /// Closes the frame being counted and returns its totals.
    pub fn end_frame(&mut self) -> FrameStats {
        if let Some(start) = self.frame_start.take() {
            self.current.cpu_frame_ms = start.elapsed().as_secs_f64() * 1000.0;
        }
        self.frames_presented += 1;

        let finished = self.current;
        self.history.push_back(finished);
        if self.history.len() > self.max_history {
            self.history.pop_front();
        }
        tracing::debug!(
            "frame {}: {} lists, {} draws, {} instances, {} pipeline binds, {:.2}ms",
            finished.frame_index,
            finished.render_lists,
            finished.draw_calls,
            finished.instances,
            finished.pipeline_switches,
            finished.cpu_frame_ms
        );
        finished
    }

    /// Counters of the frame currently being built.
    pub fn current(&self) -> &FrameStats {
        &self.current
    }

    pub fn last_frame(&self) -> Option<&FrameStats> {
        self.history.back()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn mean_draw_calls(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|f| f.draw_calls as f64).sum::<f64>() / self.history.len() as f64
    }

    pub fn peak_instances(&self) -> u32 {
        self.history.iter().map(|f| f.instances).max().unwrap_or(0)
    }
}
