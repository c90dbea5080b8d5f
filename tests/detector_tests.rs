// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the rectangle detector

use docscan::engines::{AnalysisImage, ScriptedResponse};
use docscan::errors::EngineResult;
use docscan::{
    BlockingEngine, CompletionContext, CompletionQueue, DetectionInput, DetectionOutcome, Frame,
    NotFoundReason, Orientation, Point, Quadrilateral, RectangleDetectionEngine,
    RectangleDetector, ScriptedEngine,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

fn gray_frame(width: u32, height: u32, value: u8) -> Arc<Frame> {
    Arc::new(Frame::from_gray(
        width,
        height,
        vec![value; (width * height) as usize],
    ))
}

/// Run the callback form and wait for its single invocation
async fn detect_once<E>(detector: &RectangleDetector<E>, input: DetectionInput) -> Option<Quadrilateral>
where
    E: RectangleDetectionEngine + 'static,
{
    let (sender, receiver) = oneshot::channel();
    detector.detect(input, move |quad| {
        let _ = sender.send(quad);
    });
    receiver.await.expect("completion callback dropped without running")
}

/// Run the callback form and return how often the callback ran
async fn count_callbacks<E>(detector: &RectangleDetector<E>, input: DetectionInput) -> (usize, Option<Quadrilateral>)
where
    E: RectangleDetectionEngine + 'static,
{
    let count = Arc::new(AtomicUsize::new(0));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let callback_count = Arc::clone(&count);
    detector.detect(input, move |quad| {
        callback_count.fetch_add(1, Ordering::SeqCst);
        let _ = sender.send(quad);
    });

    let first = receiver.recv().await.expect("callback never ran");
    // Give a second invocation the chance to show up
    tokio::time::sleep(Duration::from_millis(50)).await;
    (count.load(Ordering::SeqCst), first)
}

#[tokio::test]
async fn test_no_candidates_is_none() {
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(Vec::new()),
    ));

    let result = detect_once(&detector, DetectionInput::pixel_buffer(gray_frame(64, 48, 0))).await;
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_largest_candidate_selected() {
    // Dyadic coordinates so the tied areas are exactly equal
    let small = Quadrilateral::from_rect(0.0, 0.0, 0.125, 0.125);
    let large = Quadrilateral::from_rect(0.25, 0.25, 0.5, 0.5);
    let tied = Quadrilateral::from_rect(0.0, 0.0, 0.5, 0.5);
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![small, large, tied]),
    ));

    let result = detect_once(&detector, DetectionInput::pixel_buffer(gray_frame(100, 100, 0)))
        .await
        .expect("rectangle found");

    assert_eq!(result, large.scaled_to(100.0, 100.0));
}

#[tokio::test]
async fn test_scales_normalized_coordinates() {
    let quad = Quadrilateral::new(
        Point::new(0.5, 0.5),
        Point::new(1.0, 0.5),
        Point::new(1.0, 1.0),
        Point::new(0.5, 1.0),
    );
    let detector =
        RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::candidates(vec![quad])));

    let result = detect_once(&detector, DetectionInput::pixel_buffer(gray_frame(1000, 2000, 0)))
        .await
        .expect("rectangle found");

    assert_eq!(result.top_left, Point::new(500.0, 1000.0));
    assert_eq!(result.bottom_right, Point::new(1000.0, 2000.0));
}

#[tokio::test]
async fn test_rotate_90_uses_oriented_extent() {
    let quad = Quadrilateral::new(
        Point::new(0.5, 0.5),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    );
    let engine = Arc::new(ScriptedEngine::always(ScriptedResponse::candidates(vec![quad])));
    let detector = RectangleDetector::from_shared(Arc::clone(&engine), tokio::runtime::Handle::current());

    // Raw buffer is 2000x1000; upright it is 1000x2000
    let input = DetectionInput::oriented(gray_frame(2000, 1000, 0), Orientation::Rotate90);
    let result = detect_once(&detector, input).await.expect("rectangle found");

    assert_eq!(result.top_left, Point::new(500.0, 1000.0));
    assert_eq!(result.top_right, Point::new(1000.0, 0.0));
    assert_eq!(result.bottom_left, Point::new(0.0, 2000.0));

    let seen = engine.seen_requests();
    assert_eq!(seen.len(), 1);
    assert_eq!((seen[0].width, seen[0].height), (2000, 1000));
    assert_eq!(seen[0].orientation, Some(Orientation::Rotate90));
}

#[tokio::test]
async fn test_image_input_uses_image_extent() {
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.0, 0.0, 1.0, 1.0)]),
    ));
    let image = image::DynamicImage::new_rgb8(320, 240);

    let result = detect_once(&detector, DetectionInput::image(&image))
        .await
        .expect("rectangle found");

    assert_eq!(result.bottom_right, Point::new(320.0, 240.0));
}

#[tokio::test]
async fn test_exactly_one_callback_on_every_path() {
    let found = ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.1, 0.1, 0.5, 0.5)]);
    let engine = ScriptedEngine::new([
        found.clone(),
        ScriptedResponse::candidates(Vec::new()),
        ScriptedResponse::fail("engine crashed"),
        ScriptedResponse::reject("unsupported image"),
        ScriptedResponse::Panic,
        found.delayed(Duration::from_millis(20)),
    ]);
    let detector = RectangleDetector::current(engine);

    let mut results = Vec::new();
    for _ in 0..6 {
        let (count, result) =
            count_callbacks(&detector, DetectionInput::pixel_buffer(gray_frame(10, 10, 0))).await;
        assert_eq!(count, 1);
        results.push(result.is_some());
    }

    // Malformed input never reaches the engine but still completes once
    let broken = Arc::new(Frame::from_rgba(10, 10, vec![0u8; 7]));
    let (count, result) = count_callbacks(&detector, DetectionInput::pixel_buffer(broken)).await;
    assert_eq!(count, 1);
    assert_eq!(result, None);

    assert_eq!(results, vec![true, false, false, false, false, true]);
    assert_eq!(detector.engine().seen_requests().len(), 6);
}

#[tokio::test]
async fn test_synchronous_rejection_is_none() {
    let detector = RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::reject(
        "pixel format not supported",
    )));

    let result = detect_once(&detector, DetectionInput::pixel_buffer(gray_frame(8, 8, 0))).await;
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_cancel_delivers_none_once() {
    let detector = RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::Hang));
    let count = Arc::new(AtomicUsize::new(0));
    let (sender, receiver) = oneshot::channel();

    let callback_count = Arc::clone(&count);
    let handle = detector.detect_cancellable(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| {
            callback_count.fetch_add(1, Ordering::SeqCst);
            let _ = sender.send(quad);
        },
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();
    handle.cancel();

    assert_eq!(receiver.await.expect("callback ran"), None);
    assert!(handle.is_cancelled());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_after_completion_keeps_result() {
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.0, 0.0, 0.5, 0.5)]),
    ));
    let (sender, receiver) = oneshot::channel();

    let handle = detector.detect_cancellable(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| {
            let _ = sender.send(quad);
        },
    );

    let result = receiver.await.expect("callback ran");
    handle.cancel();
    assert!(result.is_some());
}

#[tokio::test]
async fn test_frame_released_after_completion() {
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.0, 0.0, 0.5, 0.5)])
            .delayed(Duration::from_millis(5)),
    ));
    let frame = gray_frame(16, 16, 0);

    let result = detector
        .detect_async(DetectionInput::pixel_buffer(Arc::clone(&frame)))
        .await;

    assert!(result.is_some());
    assert_eq!(Arc::strong_count(&frame), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queue_context_runs_on_draining_thread() {
    let (queue, mut receiver) = CompletionQueue::new();
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.0, 0.0, 0.5, 0.5)])
            .delayed(Duration::from_millis(5)),
    ))
    .with_completion_context(CompletionContext::Queue(queue));

    let draining_thread = std::thread::current().id();
    let ran_on = Arc::new(std::sync::Mutex::new(None));

    let ran_on_callback = Arc::clone(&ran_on);
    detector.detect(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| {
            *ran_on_callback.lock().unwrap() = Some((std::thread::current().id(), quad.is_some()));
        },
    );

    // Nothing runs until the queue is drained
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(ran_on.lock().unwrap().is_none());

    assert!(receiver.run_next().await);
    assert_eq!(*ran_on.lock().unwrap(), Some((draining_thread, true)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_context_delivers() {
    let detector = RectangleDetector::current(ScriptedEngine::always(
        ScriptedResponse::candidates(vec![Quadrilateral::from_rect(0.0, 0.0, 0.5, 0.5)]),
    ))
    .with_completion_context(CompletionContext::Blocking);

    let result = detect_once(&detector, DetectionInput::pixel_buffer(gray_frame(4, 4, 0))).await;
    assert!(result.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queue_context_engine_panic_runs_on_draining_thread() {
    let (queue, mut receiver) = CompletionQueue::new();
    let detector = RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::Panic))
        .with_completion_context(CompletionContext::Queue(queue));

    let draining_thread = std::thread::current().id();
    let ran_on = Arc::new(std::sync::Mutex::new(Vec::new()));

    let ran_on_callback = Arc::clone(&ran_on);
    detector.detect(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| {
            ran_on_callback
                .lock()
                .unwrap()
                .push((std::thread::current().id(), quad));
        },
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        ran_on.lock().unwrap().is_empty(),
        "Abandoned request must still wait for the queue"
    );

    assert_eq!(receiver.run_pending(), 1);
    assert_eq!(*ran_on.lock().unwrap(), vec![(draining_thread, None)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_context_engine_panic_delivers_none() {
    let detector = RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::Panic))
        .with_completion_context(CompletionContext::Blocking);

    let (count, result) =
        count_callbacks(&detector, DetectionInput::pixel_buffer(gray_frame(4, 4, 0))).await;
    assert_eq!(count, 1);
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_future_forms_survive_engine_panic() {
    let detector = RectangleDetector::current(ScriptedEngine::always(ScriptedResponse::Panic));

    let task_detector = detector.clone();
    let joined = tokio::spawn(async move {
        task_detector
            .detect_async(DetectionInput::pixel_buffer(gray_frame(8, 8, 0)))
            .await
    })
    .await;
    assert_eq!(joined.expect("detect_async must not panic"), None);

    let outcome = detector
        .detect_outcome(DetectionInput::pixel_buffer(gray_frame(8, 8, 0)))
        .await;
    assert_eq!(outcome, DetectionOutcome::NotFound(NotFoundReason::Abandoned));
}

#[test]
fn test_runtime_teardown_delivers_none_once() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let (queue, mut receiver) = CompletionQueue::new();
    let worker = RectangleDetector::new(
        ScriptedEngine::always(ScriptedResponse::Hang),
        runtime.handle().clone(),
    );
    let queued = worker
        .clone()
        .with_completion_context(CompletionContext::Queue(queue));

    let (sender, results) = std::sync::mpsc::channel();
    let worker_sender = sender.clone();
    worker.detect(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| worker_sender.send(("worker", quad)).unwrap(),
    );
    queued.detect(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| sender.send(("queue", quad)).unwrap(),
    );

    // Both requests are still pending when the runtime goes away
    drop(runtime);

    assert_eq!(results.try_recv(), Ok(("worker", None)));
    assert!(results.try_recv().is_err(), "Queued callback must wait for the receiver");

    assert_eq!(receiver.run_pending(), 1);
    assert_eq!(results.try_recv(), Ok(("queue", None)));
    assert!(results.try_recv().is_err());
}

#[test]
fn test_detect_after_runtime_shutdown_delivers_none() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let detector = RectangleDetector::new(
        ScriptedEngine::always(ScriptedResponse::candidates(vec![Quadrilateral::from_rect(
            0.0, 0.0, 0.5, 0.5,
        )])),
        runtime.handle().clone(),
    );
    drop(runtime);

    let (sender, results) = std::sync::mpsc::channel();
    detector.detect(
        DetectionInput::pixel_buffer(gray_frame(8, 8, 0)),
        move |quad| sender.send(quad).unwrap(),
    );

    assert_eq!(results.recv_timeout(Duration::from_secs(1)), Ok(None));
    assert!(results.recv_timeout(Duration::from_millis(50)).is_err());
}

/// Analyzer whose answer depends only on the image content
///
/// A frame filled with value `v` yields a square of side `v / 255` plus a
/// small decoy. Sleeps a content-dependent time to scramble completion order.
fn content_analyzer(input: &AnalysisImage) -> EngineResult<Vec<Quadrilateral>> {
    let value = input.image.to_luma8().get_pixel(0, 0)[0];
    std::thread::sleep(Duration::from_millis(u64::from(value % 7) * 3));

    if value == 0 {
        return Ok(Vec::new());
    }

    let side = f64::from(value) / 255.0;
    Ok(vec![
        Quadrilateral::from_rect(0.0, 0.0, 0.01, 0.01),
        Quadrilateral::from_rect(0.0, 0.0, side, side),
    ])
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_match_sequential() {
    let detector = RectangleDetector::current(BlockingEngine::new("content", content_analyzer));
    let values: Vec<u8> = (0..16u8).map(|i| i * 16).collect();

    let mut sequential = Vec::new();
    for &value in &values {
        let input = DetectionInput::pixel_buffer(gray_frame(32, 24, value));
        sequential.push(detector.detect_async(input).await);
    }

    let (sender, mut receiver) = mpsc::unbounded_channel();
    for (index, &value) in values.iter().enumerate() {
        let sender = sender.clone();
        detector.detect(
            DetectionInput::pixel_buffer(gray_frame(32, 24, value)),
            move |quad| {
                let _ = sender.send((index, quad));
            },
        );
    }
    drop(sender);

    let mut concurrent = vec![None; values.len()];
    let mut received = 0;
    while let Some((index, quad)) = receiver.recv().await {
        concurrent[index] = quad;
        received += 1;
    }

    assert_eq!(received, values.len());
    assert_eq!(concurrent, sequential);
    assert_eq!(sequential[0], None);
    assert_eq!(
        sequential[1],
        Some(Quadrilateral::from_rect(0.0, 0.0, 16.0 / 255.0, 16.0 / 255.0).scaled_to(32.0, 24.0))
    );
}
