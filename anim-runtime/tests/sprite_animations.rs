//! # 帧动画集成测试
//!
//! 验证逐帧推进、回调时机与源矩形写入。

mod common;

use anim_runtime::{
    AnimError, HandleExt, INVALID_HANDLE, SourceRect, SpriteAnimationId, SpriteSheet,
};
use common::{Manager, TestHost, counter, object, recorder, sheet};

fn rect(x: u32, y: u32) -> SourceRect {
    SourceRect {
        x,
        y,
        width: 32,
        height: 32,
    }
}

#[test]
fn test_loop_frame_determinism() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("coin", &[]);
    let (changes, on_frame_change) = recorder();

    let id = manager
        .create_sprite_animation(&mut host, sprite, sheet(), vec![0, 1, 2, 3], 10.0, true)
        .unwrap();
    manager.on_sprite_animation_frame_change(&mut host, id, Some(on_frame_change));
    assert!(manager.play_sprite_animation(&mut host, id));

    // 累计 0.41 秒：floor(4.1) % 4 == 0
    for dt in [0.13, 0.13, 0.13, 0.02] {
        manager.update(&mut host, dt).unwrap();
    }

    let animation = manager.sprite_animation(id).unwrap();
    assert_eq!(animation.current_frame_index(), 0);
    assert!(animation.is_playing());

    let frames: Vec<i64> = changes
        .borrow()
        .iter()
        .map(|args| args[0].as_i64().unwrap())
        .collect();
    insta::assert_snapshot!(format!("{frames:?}"), @"[1, 2, 3, 0]");
}

#[test]
fn test_non_loop_completes_once() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("explosion", &[]);
    let (completed, on_complete) = counter();

    let id = manager
        .create_sprite_animation(&mut host, sprite.clone(), sheet(), vec![5, 6, 7], 5.0, false)
        .unwrap();
    manager.on_sprite_animation_complete(&mut host, id, Some(on_complete));
    manager.play_sprite_animation(&mut host, id);

    for _ in 0..600 {
        manager.update(&mut host, 1.0 / 60.0).unwrap();
    }

    let animation = manager.sprite_animation(id).unwrap();
    assert!(animation.is_complete());
    assert!(!animation.is_playing());
    assert_eq!(animation.current_frame_index(), 2);
    assert_eq!(completed.get(), 1);

    // 第 7 格：第 1 行第 3 列
    assert_eq!(host.last_rect(&sprite), Some(rect(96, 32)));
}

#[test]
fn test_play_writes_rect_immediately() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("torch", &[]);

    let id = manager
        .create_sprite_animation(&mut host, sprite.clone(), sheet(), vec![4, 5], 8.0, true)
        .unwrap();
    assert!(host.rects.is_empty());

    manager.play_sprite_animation(&mut host, id);
    assert_eq!(host.last_rect(&sprite), Some(rect(0, 32)));
}

#[test]
fn test_rect_written_on_every_tick() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("water", &[]);

    let id = manager
        .create_sprite_animation(&mut host, sprite.clone(), sheet(), vec![0, 1], 10.0, true)
        .unwrap();
    manager.play_sprite_animation(&mut host, id);

    manager.update(&mut host, 0.15).unwrap();
    assert_eq!(host.last_rect(&sprite), Some(rect(32, 0)));
    assert_eq!(host.rects.len(), 2);

    manager.update(&mut host, 0.01).unwrap();
    assert_eq!(host.rects.len(), 3);
}

#[test]
fn test_paused_animation_does_not_advance() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("fan", &[]);

    let id = manager
        .create_sprite_animation(&mut host, sprite, sheet(), vec![0, 1, 2], 10.0, true)
        .unwrap();
    manager.play_sprite_animation(&mut host, id);
    manager.update(&mut host, 0.15).unwrap();

    assert!(manager.pause_sprite_animation(id));
    manager.update(&mut host, 1.0).unwrap();
    assert_eq!(manager.sprite_animation(id).unwrap().current_frame_index(), 1);

    assert!(manager.resume_sprite_animation(id));
    manager.update(&mut host, 0.06).unwrap();
    assert_eq!(manager.sprite_animation(id).unwrap().current_frame_index(), 2);

    assert!(manager.stop_sprite_animation(id));
    let animation = manager.sprite_animation(id).unwrap();
    assert!(!animation.is_playing());
    assert_eq!(animation.current_frame_index(), 0);
}

#[test]
fn test_set_fps_and_loop() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("flag", &[]);

    let id = manager
        .create_sprite_animation(&mut host, sprite, sheet(), vec![0, 1, 2], 10.0, true)
        .unwrap();

    let err = manager.set_sprite_animation_fps(id, 0.0).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"帧率必须是大于 0 的有限数，实际为 0");
    assert_eq!(manager.set_sprite_animation_fps(id, 20.0), Ok(true));
    assert_eq!(manager.sprite_animation(id).unwrap().fps(), 20.0);

    assert!(manager.set_sprite_animation_loop(id, false));
    assert!(!manager.sprite_animation(id).unwrap().is_looping());
}

#[test]
fn test_invalid_construction_rejected() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();

    let result =
        manager.create_sprite_animation(&mut host, object("s", &[]), sheet(), vec![0], -1.0, true);
    assert!(matches!(result, Err(AnimError::InvalidFps { .. })));

    let mut bad_sheet = sheet();
    bad_sheet.columns = 0;
    let sprite = object("s", &[]);
    let result = manager.create_sprite_animation(&mut host, sprite, bad_sheet, vec![0], 10.0, true);
    assert!(matches!(result, Err(AnimError::InvalidSheet { .. })));

    assert_eq!(manager.sprite_animation_count(), 0);
    assert_eq!(host.retains, 0);
}

#[test]
fn test_frame_outside_sheet_rejected() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let tall = SpriteSheet::new(64, 64, 1).unwrap();

    let frames = vec![0, 100_000_000];
    let err = manager
        .create_sprite_animation(&mut host, object("s", &[]), tall, frames, 10.0, true)
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"帧 100000000 超出精灵表坐标范围（64x64，每行 1 帧）"
    );
    assert_eq!(manager.sprite_animation_count(), 0);
    assert_eq!(host.retains, 0);

    // 动画控制器添加动画走同一个校验
    let hero = object("hero", &[]);
    let animator = manager.create_animator(&mut host, hero.clone(), tall).unwrap();
    let result = manager.add_animation(&mut host, animator, "fall", vec![u32::MAX], 10.0, true);
    assert!(matches!(
        result,
        Err(AnimError::InvalidFrame {
            frame: u32::MAX,
            ..
        })
    ));
    assert!(!manager.animator(animator).unwrap().has_animation("fall"));
    assert_eq!(manager.sprite_animation_count(), 0);

    // 坐标范围内最远的一帧仍然可以正常播放
    let last_row = u32::MAX / 64 - 1;
    let id = manager
        .create_sprite_animation(&mut host, hero.clone(), tall, vec![0, last_row], 10.0, true)
        .unwrap();
    manager.play_sprite_animation(&mut host, id);
    manager.update(&mut host, 0.1).unwrap();
    assert_eq!(
        host.last_rect(&hero),
        Some(SourceRect {
            x: 0,
            y: last_row * 64,
            width: 64,
            height: 64,
        })
    );
}

#[test]
fn test_complete_callback_may_destroy_animation() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();
    let sprite = object("puff", &[]);

    let id = manager
        .create_sprite_animation(&mut host, sprite.clone(), sheet(), vec![0, 1], 10.0, false)
        .unwrap();
    let on_complete = common::callback(move |host, manager, _| {
        manager.destroy_sprite_animation(host, id);
        Ok(true)
    });
    manager.on_sprite_animation_complete(&mut host, id, Some(on_complete));
    manager.play_sprite_animation(&mut host, id);
    let writes_before = host.rects.len();

    manager.update(&mut host, 1.0).unwrap();
    assert!(manager.sprite_animation(id).is_none());
    // 已销毁的动画不再写入源矩形
    assert_eq!(host.rects.len(), writes_before);
    assert_eq!(host.live_values(), 0);
}

#[test]
fn test_stale_handles_are_safe() {
    let mut host = TestHost::new();
    let mut manager = Manager::new();

    let id = manager
        .create_sprite_animation(&mut host, object("s", &[]), sheet(), vec![0, 1], 10.0, true)
        .unwrap();
    assert!(manager.destroy_sprite_animation(&mut host, id));
    assert!(!manager.destroy_sprite_animation(&mut host, id));

    assert!(!manager.play_sprite_animation(&mut host, id));
    assert!(!manager.pause_sprite_animation(id));
    assert!(!manager.resume_sprite_animation(id));
    assert_eq!(manager.set_sprite_animation_fps(id, 12.0), Ok(false));
    assert!(!manager.on_sprite_animation_complete(&mut host, id, None));
    assert!(manager.sprite_animation(id).is_none());

    let null = SpriteAnimationId::from_raw(INVALID_HANDLE);
    assert!(!manager.play_sprite_animation(&mut host, null));

    // 原始句柄往返后仍然指向同一个对象
    let live = manager
        .create_sprite_animation(&mut host, object("t", &[]), sheet(), vec![0], 10.0, true)
        .unwrap();
    let raw = live.to_raw();
    assert!(manager.sprite_animation(SpriteAnimationId::from_raw(raw)).is_some());
    manager.update(&mut host, 0.1).unwrap();
}
