//! Thread-safe parser pool for tree-sitter parsers
//!
//! Tree-sitter parsers are not Send + Sync, so parsing runs on dedicated
//! worker threads fed through a channel. Analysis workers block on their
//! response channel; parses are small and CPU-bound, so there is nothing to
//! suspend or cancel.

use anyhow::Result;
use tree_sitter::{Parser, Tree};

struct WorkerRequest {
    source: String,
    response_sender: std::sync::mpsc::Sender<Result<Tree>>,
}

/// Pool of Python parser threads.
pub struct ParserPool {
    sender: std::sync::mpsc::Sender<WorkerRequest>,
}

impl ParserPool {
    /// Create a new parser pool with the specified number of worker threads.
    pub fn new(num_workers: usize) -> Self {
        let (sender, receiver) = std::sync::mpsc::channel::<WorkerRequest>();
        let receiver = std::sync::Arc::new(std::sync::Mutex::new(receiver));

        for i in 0..num_workers {
            let receiver = receiver.clone();
            std::thread::spawn(move || {
                Self::worker_thread(i, receiver);
            });
        }

        Self { sender }
    }

    fn worker_thread(
        worker_id: usize,
        receiver: std::sync::Arc<std::sync::Mutex<std::sync::mpsc::Receiver<WorkerRequest>>>,
    ) {
        tracing::debug!("parser worker {} started", worker_id);

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
            tracing::error!("parser worker {} failed to load grammar: {}", worker_id, e);
            return;
        }

        loop {
            let request = match receiver.lock().unwrap().recv() {
                Ok(req) => req,
                Err(_) => {
                    tracing::debug!("parser worker {} shutting down", worker_id);
                    break;
                }
            };

            let WorkerRequest {
                source,
                response_sender,
            } = request;

            let result = match parser.parse(&source, None) {
                Some(tree) => Ok(tree),
                None => Err(anyhow::anyhow!("tree-sitter returned no tree")),
            };

            if response_sender.send(result).is_err() {
                tracing::warn!("failed to send parse result back to caller");
            }
        }
    }

    /// Parse source text, blocking the calling thread until a worker
    /// responds.
    pub fn parse_blocking(&self, source: &str) -> Result<Tree> {
        let (response_sender, response_receiver) = std::sync::mpsc::channel();

        let worker_request = WorkerRequest {
            source: source.to_string(),
            response_sender,
        };

        self.sender
            .send(worker_request)
            .map_err(|_| anyhow::anyhow!("parser pool is shut down"))?;

        response_receiver
            .recv()
            .map_err(|_| anyhow::anyhow!("parser worker died"))?
    }
}

impl Clone for ParserPool {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Convenience constructor sized to available cores, with a floor of 2.
pub fn create_parser_pool() -> ParserPool {
    let num_workers = std::thread::available_parallelism()
        .map(|n| n.get().max(2))
        .unwrap_or(2);

    ParserPool::new(num_workers)
}
