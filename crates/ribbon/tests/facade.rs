#![forbid(unsafe_code)]

//! End-to-end use through the facade.

use ribbon::prelude::*;
use ribbon_harness::{SyntheticHost, home_tab, picture_tab};

#[test]
fn resize_select_and_poll() {
    let mut ribbon =
        Ribbon::from_definitions(RibbonConfig::default(), &[home_tab(), picture_tab()]).unwrap();
    let mut host = SyntheticHost::new(Size::new(640, 120));

    let outcome = ribbon
        .handle_event(Event::Resize(Size::new(640, 120)), &mut host)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.index, 1);
    assert!(outcome.changed);
    assert!(ribbon.drain_events().contains(&RibbonEvent::ScaleOccurred {
        tab: "Ribbon.Home".into(),
        index: 1
    }));

    let disabled = |id: &str| !id.ends_with("Cmd0");
    assert!(ribbon.poll_commands(&disabled).unwrap() > 0);

    ribbon.show_contextual_group("PictureTools").unwrap();
    let outcome = ribbon
        .handle_event(Event::SelectTab("Ribbon.PictureFormat".into()), &mut host)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.index, -1);

    let evidence = ribbon.last_evidence().unwrap().to_jsonl();
    let value: serde_json::Value = serde_json::from_str(&evidence).unwrap();
    assert_eq!(value["tab"], "Ribbon.PictureFormat");
}
