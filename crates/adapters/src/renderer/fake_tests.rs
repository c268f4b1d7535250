// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ttm_core::{RenderEvent, TemplateId, WaitConfig};

fn empty_config(once: bool) -> RendererConfig {
    RendererConfig {
        templates: vec![],
        consul: None,
        vault: None,
        nomad: None,
        wait: WaitConfig::default(),
        max_stale: None,
        block_query_wait_time: None,
        once,
        env: std::collections::HashMap::new(),
    }
}

#[tokio::test]
async fn start_records_config_and_returns_channels() {
    let mut renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();
    let events = renderer.start(empty_config(false)).await.unwrap();
    assert_eq!(handle.start_calls().len(), 1);
    assert!(!handle.start_calls()[0].once);
    drop(events);
}

#[tokio::test]
async fn pushed_rendered_is_received() {
    let mut renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();
    let mut events = renderer.start(empty_config(false)).await.unwrap();
    let id = TemplateId::new("t1");
    handle.push_rendered(id.clone());
    assert_eq!(events.rendered.recv().await, Some(id));
}

#[tokio::test]
async fn pushed_render_event_is_received() {
    let mut renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();
    let mut events = renderer.start(empty_config(false)).await.unwrap();
    let notice = RenderChannelMsg::Decision(RenderEventNotice {
        id: TemplateId::new("t1"),
        event: RenderEvent::new(RenderEvent::ZERO, RenderEvent::ZERO),
    });
    handle.push_render_event(notice.clone());
    assert_eq!(events.render_events.recv().await, Some(notice));
}

#[tokio::test]
async fn stop_is_observed_on_handle() {
    let mut renderer = FakeTemplateRenderer::new();
    let handle = renderer.handle();
    renderer.stop().await;
    assert!(handle.is_stopped());
}
