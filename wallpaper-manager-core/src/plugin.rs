//! Method-channel front of the handler: wallpaper work runs on a background
//! thread and its reply is delivered back on the caller's context.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{error, warn};

use crate::channel::{MethodCall, MethodResult, Request};
use crate::handler::WallpaperRequestHandler;
use crate::model::{ResultCode, WallpaperRequest};

type Reply = Box<dyn FnOnce(MethodResult) + Send + 'static>;
type Job = Box<dyn FnOnce() + Send + 'static>;

fn spawn_worker(job: Job) -> io::Result<()> {
    thread::Builder::new().name("wallpaper-worker".to_string()).spawn(job).map(drop)
}

struct Completion {
    reply: Reply,
    result: MethodResult,
}

/// Queue of finished requests, drained by the thread that issued them.
pub struct MainContext {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Default for MainContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MainContext {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Runs every reply that is ready, without blocking. Returns how many ran.
    pub fn dispatch_pending(&self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.rx.try_recv() {
            (completion.reply)(completion.result);
            count += 1;
        }
        count
    }

    /// Blocks until one reply is ready and runs it.
    pub fn dispatch_next(&self) {
        // self.tx keeps the channel open, so recv only returns once a reply arrives
        if let Ok(completion) = self.rx.recv() {
            (completion.reply)(completion.result);
        }
    }
}

pub struct WallpaperPlugin {
    handler: Arc<WallpaperRequestHandler>,
    main: Sender<Completion>,
}

impl WallpaperPlugin {
    pub fn new(handler: WallpaperRequestHandler, main: &MainContext) -> Self {
        Self { handler: Arc::new(handler), main: main.tx.clone() }
    }

    pub fn channel_name(&self) -> &str {
        &self.handler.config().channel_name
    }

    /// Answers `call` through `reply`. Cheap calls reply immediately; wallpaper
    /// changes reply later, from [`MainContext::dispatch_pending`].
    pub fn on_method_call<F>(&self, call: MethodCall, reply: F)
    where
        F: FnOnce(MethodResult) + Send + 'static,
    {
        match Request::from_call(&call) {
            Ok(None) => {
                warn!("Method {} is not implemented on {}", call.method, self.channel_name());
                reply(MethodResult::NotImplemented)
            }
            Err(e) => {
                warn!("Rejecting {}: {}", call.method, e);
                reply(MethodResult::error(MethodResult::BAD_ARGS, e.to_string()))
            }
            Ok(Some(Request::PlatformVersion)) => {
                reply(MethodResult::success(self.handler.platform_version()))
            }
            Ok(Some(Request::SetWallpaper(request))) => {
                self.spawn_set(request, Box::new(reply), spawn_worker)
            }
        }
    }

    /// Hands `request` to a worker from `spawn`. When no worker can be
    /// started the reply still arrives through the main context, as a failure.
    fn spawn_set(&self, request: WallpaperRequest, reply: Reply, spawn: fn(Job) -> io::Result<()>) {
        let pending = Arc::new(Mutex::new(Some(reply)));
        let handler = Arc::clone(&self.handler);
        let main = self.main.clone();
        let worker_reply = Arc::clone(&pending);
        let job: Job = Box::new(move || {
            let code = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&request)))
                .unwrap_or_else(|_| {
                    error!("Wallpaper worker panicked while handling {}", request.source);
                    ResultCode::FAILURE
                });
            if let Some(reply) = take_reply(&worker_reply) {
                complete(&main, reply, code);
            }
        });
        if let Err(e) = spawn(job) {
            error!("Failed to start wallpaper worker: {}", e);
            if let Some(reply) = take_reply(&pending) {
                complete(&self.main, reply, ResultCode::FAILURE);
            }
        }
    }
}

fn take_reply(slot: &Mutex<Option<Reply>>) -> Option<Reply> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take()
}

fn complete(main: &Sender<Completion>, reply: Reply, code: ResultCode) {
    let completion = Completion { reply, result: MethodResult::success(i32::from(code)) };
    if main.send(completion).is_err() {
        warn!("Main context is gone, dropping wallpaper result {}", code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{ImageSource, WallpaperLocation};
    use crate::test_support::{png_bytes, MemoryAssets, RecordingService};
    use serde_json::json;

    fn plugin(main: &MainContext, assets: MemoryAssets) -> WallpaperPlugin {
        let handler = WallpaperRequestHandler::new(
            Arc::new(RecordingService::new(Some(33))),
            Arc::new(assets),
            Config::default(),
        );
        WallpaperPlugin::new(handler, main)
    }

    fn collect(results: &Arc<Mutex<Vec<MethodResult>>>) -> impl FnOnce(MethodResult) + Send + 'static {
        let results = Arc::clone(results);
        move |r| results.lock().unwrap().push(r)
    }

    #[test]
    fn version_and_unknown_methods_reply_immediately() {
        let main = MainContext::new();
        let plugin = plugin(&main, MemoryAssets::default());
        let results = Arc::new(Mutex::new(Vec::new()));

        plugin.on_method_call(MethodCall::new("getPlatformVersion", json!(null)), collect(&results));
        plugin.on_method_call(MethodCall::new("nope", json!({})), collect(&results));
        plugin.on_method_call(
            MethodCall::new("setWallpaperFromFile", json!({ "filePath": 3 })),
            collect(&results),
        );

        let results = results.lock().unwrap();
        assert_eq!(results[0], MethodResult::success("Android 14"));
        assert_eq!(results[1], MethodResult::NotImplemented);
        assert!(matches!(&results[2], MethodResult::Error { code, .. } if code == MethodResult::BAD_ARGS));
        assert_eq!(main.dispatch_pending(), 0);
    }

    #[test]
    fn set_reply_runs_on_the_dispatching_thread() {
        let main = MainContext::new();
        let assets = MemoryAssets::default().with("flutter_assets/a.png", png_bytes(2, 2, [0, 0, 0, 255]));
        let plugin = plugin(&main, assets);
        let seen = Arc::new(Mutex::new(None));

        let caller = std::thread::current().id();
        let slot = Arc::clone(&seen);
        plugin.on_method_call(
            MethodCall::new("setWallpaperFromAsset", json!({ "assetPath": "a.png", "wallpaperLocation": 1 })),
            move |r| *slot.lock().unwrap() = Some((r, std::thread::current().id())),
        );
        main.dispatch_next();

        let (result, thread) = seen.lock().unwrap().take().unwrap();
        assert_eq!(result, MethodResult::success(RecordingService::WALLPAPER_ID));
        assert_eq!(thread, caller);
    }

    #[test]
    fn failed_set_replies_with_failure_code() {
        let main = MainContext::new();
        let plugin = plugin(&main, MemoryAssets::default());
        let results = Arc::new(Mutex::new(Vec::new()));

        plugin.on_method_call(
            MethodCall::new("setWallpaperFromAsset", json!({ "assetPath": "missing.png", "wallpaperLocation": 1 })),
            collect(&results),
        );
        main.dispatch_next();

        assert_eq!(results.lock().unwrap().as_slice(), &[MethodResult::success(-1)]);
    }

    #[test]
    fn worker_start_failure_still_replies() {
        let main = MainContext::new();
        let assets = MemoryAssets::default().with("flutter_assets/a.png", png_bytes(2, 2, [0, 0, 0, 255]));
        let plugin = plugin(&main, assets);
        let results = Arc::new(Mutex::new(Vec::new()));

        let request = WallpaperRequest::new(ImageSource::Asset("a.png".into()), WallpaperLocation::Home);
        plugin.spawn_set(request, Box::new(collect(&results)), |_job| {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit reached"))
        });

        assert!(results.lock().unwrap().is_empty());
        assert_eq!(main.dispatch_pending(), 1);
        assert_eq!(results.lock().unwrap().as_slice(), &[MethodResult::success(-1)]);
    }
}
