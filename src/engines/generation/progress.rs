use std::sync::mpsc::Sender;

pub trait ProgressCallback: Send {
    fn on_seeds_replayed(&mut self, seeds: usize);
    fn on_warmup_complete(&mut self, parents: usize);
    fn on_generation_complete(&mut self, generation: usize, parents: usize, best_covered: usize);
}

pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_seeds_replayed(&mut self, seeds: usize) {
        log::info!("Replayed {} seed sequences", seeds);
    }

    fn on_warmup_complete(&mut self, parents: usize) {
        log::info!("Warmup selected {} starting parents", parents);
    }

    fn on_generation_complete(&mut self, generation: usize, parents: usize, best_covered: usize) {
        log::info!(
            "Generation {} complete. Parents: {}, best coverage: {} sites",
            generation, parents, best_covered
        );
    }
}

// For observers on another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    SeedsReplayed(usize),
    WarmupComplete { parents: usize },
    GenerationComplete { generation: usize, parents: usize, best_covered: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_seeds_replayed(&mut self, seeds: usize) {
        let _ = self.sender.send(ProgressMessage::SeedsReplayed(seeds));
    }

    fn on_warmup_complete(&mut self, parents: usize) {
        let _ = self.sender.send(ProgressMessage::WarmupComplete { parents });
    }

    fn on_generation_complete(&mut self, generation: usize, parents: usize, best_covered: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            parents,
            best_covered,
        });
    }
}
