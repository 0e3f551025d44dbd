/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */


use eventlog::registry::{EventDecoderRegistry, TypedEventPayload};
use eventlog::{interpret_event, Digest, DigestAlgorithm, Event, EventType};
use tcg_eventlog::uefi::model::ActionEvent;

/// Test Objective: install a process-wide registry before first use
/// Expected Result: interpret_event uses it and a second install is refused
#[test]
fn test_install_global_registry() {
    let mut registry = EventDecoderRegistry::new();
    registry.register(EventType::PcClient(0x4), |_| {
        Ok(TypedEventPayload::Action(ActionEvent { action: "custom separator".to_string() }))
    });
    assert!(EventDecoderRegistry::install(registry).is_ok());

    let digest = Digest::zero(DigestAlgorithm::Sha1);
    let event = Event::new(7, EventType::PcClient(0x4), vec![digest], vec![0; 4]);
    assert_eq!(
        interpret_event(&event),
        TypedEventPayload::Action(ActionEvent { action: "custom separator".to_string() })
    );
    assert_eq!(EventDecoderRegistry::global().len(), 1);

    let again = EventDecoderRegistry::install(EventDecoderRegistry::with_default_catalog());
    assert!(again.is_err());
    assert_eq!(EventDecoderRegistry::global().len(), 1);
}
