// Integration tests for loading a log from disk and replaying it

use dtn_log_player::{
    parse_log_file, parse_log_str, Event, FrameView, NodeState, PlaybackState, Player,
    PlayerConfig, PlayerError, Scheduler, StepDelay, TimerQueue,
};
use std::io::Write;
use std::time::Duration;

const RUN_LOG: &str = "\
--Declare
area=400|300
node=f1 type=ferry group=1 color=255|0|0 buffer=4 range=50|100
node=s1 type=sensor group=2 color=0|255|0 buffer=2
node=s2 type=sensor group=2 color=0|0|255 buffer=2
--Events
Time=0
event=pos node=f1 x=10 y=10
event=pos node=s1 x=100 y=50
event=pos node=s2 x=200 y=150
Time=1
event=route node=f1 tour=s1|s2|f1
event=beacon node=f1
Time=2
event=buffer node=s1 list=m1|m2
Time=3
event=pos node=f1 x=100 y=45
event=send source=s1 dest=f1 meta=m1
Time=2
event=buffer node=s2 list=m3||
Time=4
event=buffer node=f1 list=m1
event=buffer node=s1 list=m2
event=contact a=f1 b=s1
Time=5
event=pos node=f1 x=200 y=140
";

/// One entry per render call
#[derive(Debug, Clone, PartialEq)]
struct Rendered {
    index: usize,
    time: f64,
    transient: usize,
    route: Option<Vec<String>>,
    buffer: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct RecordingRenderer {
    frames: Vec<Rendered>,
}

impl dtn_log_player::Renderer for RecordingRenderer {
    fn render(&mut self, view: &FrameView<'_>) {
        self.frames.push(Rendered {
            index: view.index,
            time: view.time(),
            transient: view.transient_events().count(),
            route: view.route().map(<[String]>::to_vec),
            buffer: view.selected_buffer().map(<[String]>::to_vec),
        });
    }
}

fn player_with(config: PlayerConfig) -> Player<TimerQueue, RecordingRenderer> {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = parse_log_str(RUN_LOG).unwrap();
    Player::new(log, config, TimerQueue::new(), RecordingRenderer::default()).unwrap()
}

fn player() -> Player<TimerQueue, RecordingRenderer> {
    player_with(PlayerConfig::new().with_step_delay(StepDelay::new(10, 20, 300)))
}

fn states(player: &Player<TimerQueue, RecordingRenderer>) -> Vec<NodeState> {
    player.nodes().iter().map(|node| node.state.clone()).collect()
}

/// Fire timers until the queue runs dry
fn drain(player: &mut Player<TimerQueue, RecordingRenderer>) {
    while let Some(timer) = player.scheduler_mut().pop_due() {
        player.on_timer(timer.handle).unwrap();
    }
}

#[test]
fn test_timeline_is_sorted_and_merged() {
    let log = parse_log_str(RUN_LOG).unwrap();
    let times: Vec<f64> = log.timeline.times().collect();
    assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

    // The second Time=2 block is appended to the first one
    let kinds: Vec<&str> = log.timeline[2].events.iter().map(Event::kind).collect();
    assert_eq!(kinds, vec!["buffer", "buffer"]);
}

#[test]
fn test_load_applies_first_frame() {
    let player = player();

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(player.index(), 0);
    assert!(player.nodes().unplaced().is_empty());
    assert_eq!(player.renderer().frames.len(), 1);
    assert_eq!(player.renderer().frames[0].index, 0);
}

#[test]
fn test_play_runs_to_end_and_stops() {
    let mut player = player();
    player.play().unwrap();
    assert!(player.is_playing());

    drain(&mut player);

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(player.is_finished());
    assert_eq!(player.displayed_index(), 5);
    assert_eq!(player.current_time(), 5.0);
    assert!(player.pending_timer().is_none());

    let f1 = player.nodes().node("f1").unwrap();
    assert_eq!(f1.state.pos, Some((200.0, 140.0)));
    assert_eq!(f1.state.buffer, vec!["m1"]);

    // Load render, then one render per tick
    let indices: Vec<usize> = player.renderer().frames.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_no_auto_rewind_after_end() {
    let mut player = player();
    player.play().unwrap();
    drain(&mut player);

    let renders = player.renderer().frames.len();
    player.play().unwrap();

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert_eq!(player.renderer().frames.len(), renders);
    assert!(matches!(player.step(), Err(PlayerError::EndOfTimeline)));
}

#[test]
fn test_tick_delays_follow_slowest_class() {
    let mut player = player();
    player.play().unwrap();

    let mut delays = Vec::new();
    while let Some(timer) = player.scheduler_mut().pop_due() {
        delays.push(timer.delay);
        player.on_timer(timer.handle).unwrap();
    }

    let ms = |v| Duration::from_millis(v);
    // frames: pos | route+beacon | buffer | pos+send | buffer+contact | pos
    // the final tick finds the end of the timeline and schedules nothing
    assert_eq!(delays, vec![ms(10), ms(10), ms(20), ms(300), ms(300), ms(10)]);
}

#[test]
fn test_pause_cancels_pending_tick() {
    let mut player = player();
    player.play().unwrap();
    let pending = player.pending_timer().unwrap();

    player.pause();
    assert!(player.scheduler().is_idle());

    // A late delivery of the cancelled handle does nothing
    player.on_timer(pending).unwrap();
    assert_eq!(player.index(), 1);

    player.pause();
    assert_eq!(player.state(), PlaybackState::Stopped);
}

#[test]
fn test_toggle() {
    let mut player = player();
    player.toggle().unwrap();
    assert!(player.is_playing());
    player.toggle().unwrap();
    assert!(!player.is_playing());
    assert!(player.scheduler().is_idle());
}

#[test]
fn test_jump_is_deterministic() {
    for k in 0..6 {
        let mut once = player();
        once.jump(k).unwrap();

        let mut twice = player();
        twice.jump(5).unwrap();
        twice.jump(k).unwrap();
        twice.jump(k).unwrap();

        assert_eq!(states(&once), states(&twice), "frame {k}");
        assert_eq!(twice.index(), k);
    }
}

#[test]
fn test_forward_steps_match_jump() {
    for k in 0..6 {
        let mut stepped = player();
        for _ in 0..=k {
            stepped.step().unwrap();
        }

        let mut jumped = player();
        jumped.jump(k).unwrap();

        assert_eq!(states(&stepped), states(&jumped), "frame {k}");
        assert_eq!(stepped.displayed_index(), jumped.displayed_index());
    }
}

#[test]
fn test_jump_backwards_forgets_later_state() {
    let mut player = player();
    player.jump(4).unwrap();
    assert_eq!(player.nodes().node("s1").unwrap().state.buffer, vec!["m2"]);

    player.jump(1).unwrap();
    let s1 = player.nodes().node("s1").unwrap();
    assert!(s1.state.buffer.is_empty());
    assert_eq!(player.nodes().node("f1").unwrap().state.route, vec!["s1", "s2", "f1"]);
}

#[test]
fn test_jump_pauses_and_renders_once() {
    let mut player = player();
    player.play().unwrap();
    let before = player.renderer().frames.len();

    player.jump(3).unwrap();

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(player.scheduler().is_idle());
    assert_eq!(player.renderer().frames.len(), before + 1);

    let last = player.renderer().frames.last().unwrap();
    assert_eq!(last.index, 3);
    assert_eq!(last.time, 3.0);
    assert_eq!(last.transient, 1);
}

#[test]
fn test_jump_out_of_range_leaves_state_alone() {
    let mut player = player();
    player.jump(2).unwrap();
    let before = states(&player);

    let err = player.jump(6).unwrap_err();
    assert!(matches!(err, PlayerError::OutOfBounds { index: 6, len: 6 }));
    assert_eq!(states(&player), before);
    assert_eq!(player.index(), 2);
}

#[test]
fn test_reset_to_zero() {
    let mut rewound = player();
    rewound.jump(5).unwrap();
    rewound.reset_to_zero().unwrap();

    let fresh = player();
    assert_eq!(states(&rewound), states(&fresh));
    assert_eq!(rewound.index(), 0);
}

#[test]
fn test_jump_to_time() {
    let mut player = player();
    player.jump_to_time(3.5).unwrap();
    assert_eq!(player.displayed_index(), 3);

    player.jump_to_time(-1.0).unwrap();
    assert_eq!(player.displayed_index(), 0);
}

#[test]
fn test_snapshots_do_not_change_replay() {
    let mut plain = player();
    let mut cached = player_with(
        PlayerConfig::new()
            .with_step_delay(StepDelay::new(10, 20, 300))
            .with_snapshot_interval(2),
    );

    cached.jump(5).unwrap();
    for k in [4, 1, 3, 5, 0, 2] {
        plain.jump(k).unwrap();
        cached.jump(k).unwrap();
        assert_eq!(states(&plain), states(&cached), "frame {k}");
    }
}

#[test]
fn test_select_node() {
    let mut player = player();
    player.jump(2).unwrap();
    player.select_node(Some("s1")).unwrap();

    assert_eq!(player.selected_node(), Some("s1"));
    let last = player.renderer().frames.last().unwrap();
    assert_eq!(last.buffer, Some(vec!["m1".to_string(), "m2".to_string()]));
    assert_eq!(last.route, Some(Vec::new()));

    assert!(matches!(
        player.select_node(Some("ghost")),
        Err(PlayerError::UnknownNodeReference(_))
    ));
    assert_eq!(player.selected_node(), Some("s1"));

    player.select_node(None).unwrap();
    assert_eq!(player.renderer().frames.last().unwrap().route, None);
}

#[test]
fn test_node_labels() {
    let mut player = player();
    player.jump(2).unwrap();
    assert_eq!(player.node_labels(), vec!["f1 [0/4]", "s1 [2/2]", "s2 [1/2]"]);
}

#[test]
fn test_unknown_node_pauses_playback() {
    let log = parse_log_str(
        "--Declare\nnode=a type=t color=0|0|0\n--Events\nTime=0\nevent=pos node=a x=0 y=0\nTime=1\nevent=beacon node=b\n",
    )
    .unwrap();
    let mut player = Player::new(log, PlayerConfig::new(), TimerQueue::new(), RecordingRenderer::default()).unwrap();

    player.play().unwrap();
    let timer = player.scheduler_mut().pop_due().unwrap();
    let err = player.on_timer(timer.handle).unwrap_err();

    assert!(matches!(err, PlayerError::UnknownNodeReference(ref nid) if nid == "b"));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(player.scheduler().is_idle());
    assert!(player.jump(1).is_err());
}

#[test]
fn test_drop_cancels_pending_tick() {
    struct Shared(std::rc::Rc<std::cell::RefCell<TimerQueue>>);

    impl Scheduler for Shared {
        fn schedule(&mut self, delay: Duration) -> dtn_log_player::TimerHandle {
            self.0.borrow_mut().schedule(delay)
        }

        fn cancel(&mut self, handle: dtn_log_player::TimerHandle) {
            self.0.borrow_mut().cancel(handle)
        }
    }

    let queue = std::rc::Rc::new(std::cell::RefCell::new(TimerQueue::new()));
    let log = parse_log_str(RUN_LOG).unwrap();
    let mut player = Player::new(
        log,
        PlayerConfig::new(),
        Shared(queue.clone()),
        RecordingRenderer::default(),
    )
    .unwrap();

    player.play().unwrap();
    assert_eq!(queue.borrow().pending_count(), 1);

    drop(player);
    assert!(queue.borrow().is_idle());
}

#[test]
fn test_end_to_end_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "--Declare\narea=100|100\nnode=n1 type=relay group=0 color=10|20|30 buffer=2\n\
         --Events\nTime=0\nevent=pos node=n1 x=5 y=5\nTime=1\nevent=buffer node=n1 list=pkt1|pkt2\n"
    )
    .unwrap();

    let log = parse_log_file(file.path()).unwrap();
    let mut player = Player::new(log, PlayerConfig::new(), TimerQueue::new(), RecordingRenderer::default()).unwrap();
    player.jump(1).unwrap();

    let n1 = player.nodes().node("n1").unwrap();
    assert_eq!(n1.state.pos, Some((5.0, 5.0)));
    assert_eq!(n1.state.buffer, vec!["pkt1", "pkt2"]);
    assert_eq!(n1.display_label(), "n1 [2/2]");
}

#[test]
fn test_node_table_serializes_to_json() {
    let mut player = player();
    player.jump(1).unwrap();

    let json = serde_json::to_value(player.nodes()).unwrap();
    assert_eq!(json["f1"]["state"]["route"], serde_json::json!(["s1", "s2", "f1"]));
    assert_eq!(json["s1"]["state"]["pos"], serde_json::json!([100.0, 50.0]));
}
