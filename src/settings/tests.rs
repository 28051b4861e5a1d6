use super::*;
use crate::locators::LocatorTable;
use crate::testing::{DriverCall, MockDriver, MockElement};
use crate::types::FrameContext;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

const FRAME: &str = "Nonprofit Success Pack Settings";

fn sel(key: &str, args: &[&str]) -> String {
    LocatorTable::npsp_defaults().resolve(key, args).unwrap()
}

fn add(driver: &MockDriver, key: &str, args: &[&str], element: MockElement) {
    driver.page().add_element(&sel(key, args), element);
}

fn settings_driver() -> MockDriver {
    let driver = MockDriver::new();
    driver.page().add_frame(FRAME);
    add(&driver, "frame", &[FRAME], MockElement::new());
    driver
}

fn page_with(driver: MockDriver) -> SettingsPage<MockDriver> {
    let mut config = Config::default();
    config.org.base_url = "https://acme.lightning.force.com".to_string();
    config.org.namespace_prefix = "npsp__".to_string();
    SettingsPage::new(driver, Arc::new(LocatorTable::npsp_defaults()), config).unwrap()
}

fn toggled_on_click(driver: &MockDriver, label: &str, effect: impl Fn(&mut crate::testing::MockPage) + Send + Sync + 'static) {
    let checkbox = sel("npsp_settings.checkbox", &[label]);
    driver.page().add_element(&checkbox, MockElement::new());
    driver.on_click(&checkbox, effect);
}

mod navigation {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_open_settings_page_enters_frame() {
        let page = page_with(settings_driver());

        page.open_settings_page().await.unwrap();

        let calls = page.driver().calls();
        assert_eq!(
            calls[0],
            DriverCall::Navigate(
                "https://acme.lightning.force.com/lightning/n/npsp__NPSP_Settings".to_string()
            )
        );
        assert_eq!(calls[1], DriverCall::WaitLoading);
        assert!(calls.contains(&DriverCall::SelectFrame(FRAME.to_string())));
        assert_eq!(
            page.driver().current_frame(),
            FrameContext::Frame(FRAME.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_frame_fails_after_element_timeout() {
        let page = page_with(MockDriver::new());
        let start = Instant::now();

        let err = page.open_settings_page().await.unwrap_err();

        assert!(matches!(err, PageError::Timeout(ref m) if m.contains(FRAME)));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[test]
    fn test_settings_url_requires_base_url() {
        let page = SettingsPage::new(
            MockDriver::new(),
            Arc::new(LocatorTable::npsp_defaults()),
            Config::default(),
        )
        .unwrap();
        assert!(matches!(
            page.settings_url(),
            Err(PageError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_poll_budget_is_rejected_at_construction() {
        let mut config = Config::default();
        config.message_poll.attempts = 0;

        let result = SettingsPage::new(
            MockDriver::new(),
            Arc::new(LocatorTable::npsp_defaults()),
            config,
        );

        assert!(matches!(result, Err(PageError::Configuration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_smallest_poll_budget_checks_once() {
        let mut config = Config::default();
        config.org.base_url = "https://acme.lightning.force.com".to_string();
        config.message_poll.attempts = 1;
        let page = SettingsPage::new(
            settings_driver(),
            Arc::new(LocatorTable::npsp_defaults()),
            config,
        )
        .unwrap();
        assert_eq!(page.config().message_poll.attempts, 1);
        let start = Instant::now();

        assert_err!(page.wait_for_message("Gift Entry Enabled").await);

        assert_eq!(page.driver().presence_checks("Gift Entry Enabled"), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

mod menus {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_standard_link_click_for_ordinary_titles() {
        for title in ["Recurring Donations", "System Tools", "donations", "Donations Batch"] {
            let driver = settings_driver();
            driver.page().add_link(title);
            add(&driver, "npsp_settings.main_menu", &[title], MockElement::new());
            let page = page_with(driver);

            page.open_main_menu(title).await.unwrap();

            let driver = page.driver();
            assert_eq!(driver.count_calls(|c| matches!(c, DriverCall::ClickLink(t) if t == title)), 1);
            assert_eq!(driver.count_calls(|c| matches!(c, DriverCall::JsClick(_))), 0);
            assert_eq!(driver.screenshot_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_donations_uses_script_click() {
        let driver = settings_driver();
        driver.page().add_text("Donations");
        add(&driver, "npsp_settings.donations_link", &["Donations"], MockElement::new());
        let page = page_with(driver);

        page.open_main_menu("Donations").await.unwrap();

        let donations = sel("npsp_settings.donations_link", &["Donations"]);
        let driver = page.driver();
        assert_eq!(driver.count_calls(|c| *c == DriverCall::JsClick(donations.clone())), 1);
        assert_eq!(driver.count_calls(|c| matches!(c, DriverCall::ClickLink(_))), 0);
        assert_eq!(driver.screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_title_still_captures_screenshot() {
        let page = page_with(settings_driver());

        let err = page.open_main_menu("Batch Gift Entry").await.unwrap_err();

        assert_eq!(err.to_string(), "Batch Gift Entry link was not found on the page");
        assert_eq!(page.driver().screenshot_count(), 1);
        assert_eq!(page.driver().click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_menu_that_never_expands_names_the_title() {
        let driver = settings_driver();
        driver.page().add_link("People");
        let page = page_with(driver);

        let err = page.open_main_menu("People").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "click on People link was not successful even after 30 seconds"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_sub_link_confirms_panel() {
        let driver = settings_driver();
        driver.page().add_link("Opportunity Names");
        add(&driver, "npsp_settings.panel_sub_link", &["Opportunity Names"], MockElement::new());
        let page = page_with(driver);

        page.open_sub_link("Opportunity Names").await.unwrap();

        assert!(page
            .driver()
            .calls()
            .contains(&DriverCall::ClickLink("Opportunity Names".to_string())));
        assert_eq!(page.driver().screenshot_count(), 1);
    }
}

mod controls {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_click_settings_button_uses_script_click() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.batch-button", &["idPanelCon", "Edit"], MockElement::new());
        let page = page_with(driver);

        page.click_settings_button("idPanelCon", "Edit").await.unwrap();

        let button = sel("npsp_settings.batch-button", &["idPanelCon", "Edit"]);
        assert!(page.driver().calls().contains(&DriverCall::JsClick(button)));
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_settings_button_times_out_with_screenshot() {
        let driver = settings_driver();
        add(
            &driver,
            "npsp_settings.batch-button",
            &["idPanelCon", "Save"],
            MockElement::new().hidden(),
        );
        let page = page_with(driver);
        let start = Instant::now();

        let err = page.click_settings_button("idPanelCon", "Save").await.unwrap_err();

        assert!(matches!(err, PageError::Timeout(_)));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(page.driver().click_count(), 0);
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_selection_requires_edit_mode() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.list", &["Household Naming"], MockElement::new().with_options(&["Yes"]));
        let page = page_with(driver);
        let start = Instant::now();

        let err = page.edit_selection("Household Naming", "Yes").await.unwrap_err();

        assert!(matches!(err, PageError::Precondition(ref m) if m == "Edit mode is not active"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            page.driver()
                .count_calls(|c| matches!(c, DriverCall::SelectLabel(_, _) | DriverCall::Focus(_))),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_selection_selects_and_settles() {
        let driver = settings_driver();
        driver.set_list_selection_sticks(true);
        add(&driver, "npsp_settings.batch-button", &["idPanelCon", "Save"], MockElement::new());
        add(
            &driver,
            "npsp_settings.list",
            &["Household Naming"],
            MockElement::new().with_options(&["Yes", "No"]),
        );
        let page = page_with(driver);
        let start = Instant::now();

        page.edit_selection("Household Naming", "No").await.unwrap();

        let list = sel("npsp_settings.list", &["Household Naming"]);
        let calls = page.driver().calls();
        assert!(calls.contains(&DriverCall::Focus(list.clone())));
        assert!(calls.contains(&DriverCall::SelectLabel(list, "No".to_string())));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_selection_settle_is_bounded() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.batch-button", &["idPanelCon", "Save"], MockElement::new());
        add(
            &driver,
            "npsp_settings.list",
            &["Household Naming"],
            MockElement::new().with_options(&["Yes"]),
        );
        let page = page_with(driver);
        let start = Instant::now();

        page.edit_selection("Household Naming", "Yes").await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_selection_requires_view_mode() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.list_val", &["Household Naming", "Yes"], MockElement::new());
        let page = page_with(driver);
        let start = Instant::now();

        let err = page.verify_selection("Household Naming", "Yes").await.unwrap_err();

        assert!(matches!(err, PageError::Precondition(ref m) if m == "Still in Edit mode"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_selection_reports_mismatch() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.batch-button", &["idPanelCon", "Edit"], MockElement::new());
        add(&driver, "npsp_settings.list_val", &["Household Naming", "Yes"], MockElement::new());
        let page = page_with(driver);

        assert_ok!(page.verify_selection("Household Naming", "Yes").await);

        let err = assert_err!(page.verify_selection("Household Naming", "No").await);
        assert!(matches!(err, PageError::Assertion(ref m) if m == "Household Naming did not contain No"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_toggle_button_sequence() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.checkbox", &["Gift Entry"], MockElement::new());
        let page = page_with(driver);

        page.click_toggle_button("Gift Entry").await.unwrap();

        let checkbox = sel("npsp_settings.checkbox", &["Gift Entry"]);
        let calls = page.driver().calls();
        let tail: Vec<_> = calls
            .into_iter()
            .filter(|c| !matches!(c, DriverCall::SelectFrame(_) | DriverCall::UnselectFrame))
            .collect();
        assert_eq!(
            tail,
            vec![
                DriverCall::ScrollIntoView(checkbox.clone()),
                DriverCall::Screenshot,
                DriverCall::Click(checkbox),
                DriverCall::Screenshot,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_toggle_is_reported() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.checkbox", &["Gift Entry"], MockElement::new().disabled());
        let page = page_with(driver);

        let err = page.click_toggle_button("Gift Entry").await.unwrap_err();

        assert_eq!(err.to_string(), "Checkbox could not be found on the page");
        assert_eq!(page.driver().click_count(), 0);
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_advanced_mapping_waits_for_objects() {
        let driver = settings_driver();
        add(&driver, "id", &["navigateAdvancedMapping"], MockElement::new());
        driver.on_click(&sel("id", &["navigateAdvancedMapping"]), |page| {
            page.reveal_text_after("Account", 3)
        });
        let page = page_with(driver);

        page.click_configure_advanced_mapping().await.unwrap();
    }
}

mod polling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_message_budget() {
        let page = page_with(settings_driver());
        let start = Instant::now();

        let err = page.wait_for_message("Gift Entry Enabled").await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Timed out waiting for Gift Entry Enabled to display"
        );
        assert_eq!(page.driver().presence_checks("Gift Entry Enabled"), 13);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
        assert!(start.elapsed() <= Duration::from_secs(130));
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_message_stops_when_displayed() {
        let driver = settings_driver();
        driver.page().reveal_text_after("Advanced Mapping is enabled", 4);
        let page = page_with(driver);
        let start = Instant::now();

        page.wait_for_message("Advanced Mapping is enabled").await.unwrap();

        assert_eq!(page.driver().presence_checks("Advanced Mapping is enabled"), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_already_present_needs_one_check() {
        let driver = settings_driver();
        driver.page().add_text("Gift Entry Disabled");
        let page = page_with(driver);
        let start = Instant::now();

        page.wait_for_message("Gift Entry Disabled").await.unwrap();

        assert_eq!(page.driver().presence_checks("Gift Entry Disabled"), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

mod features {
    use super::*;

    fn with_advanced_mapping(class: &str) -> MockDriver {
        let driver = settings_driver();
        let probe = sel("id", &["navigateAdvancedMapping"]);
        driver
            .page()
            .add_element(&probe, MockElement::new().with_attribute("class", class));
        toggled_on_click(&driver, "Advanced Mapping", move |page| {
            page.set_attribute(&probe, "class", "slds-button");
            page.reveal_text_after("Advanced Mapping is enabled", 2);
        });
        driver
    }

    fn with_gift_entry(driver: &MockDriver, checked: Option<&str>) {
        let probe = sel("id", &["enableGiftEntryToggle"]);
        let mut element = MockElement::new();
        if let Some(value) = checked {
            element = element.with_attribute("checked", value);
        }
        driver.page().add_element(&probe, element);
        toggled_on_click(driver, "Gift Entry", move |page| {
            let enabled = !page.contains_text("Gift Entry Enabled");
            page.set_attribute(&probe, "checked", if enabled { "true" } else { "false" });
            page.reveal_text_after(
                if enabled { "Gift Entry Enabled" } else { "Gift Entry Disabled" },
                1,
            );
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_advanced_mapping_gets_enabled() {
        let page = page_with(with_advanced_mapping("slds-hide foo"));

        page.enable_advanced_mapping_if_not_enabled().await.unwrap();

        let driver = page.driver();
        assert_eq!(driver.click_count(), 1);
        assert_eq!(driver.presence_checks("Advanced Mapping is enabled"), 2);
        let calls = driver.calls();
        let message_at = calls
            .iter()
            .rposition(|c| matches!(c, DriverCall::PageContains(_)))
            .unwrap();
        assert!(calls[message_at..].contains(&DriverCall::SelectFrame(FRAME.to_string())));
        assert_eq!(page.feature_state(Feature::AdvancedMapping).await.unwrap(), FeatureState::Enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_advanced_mapping_is_left_alone() {
        let page = page_with(with_advanced_mapping("foo"));

        page.enable_advanced_mapping_if_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 0);
        assert_eq!(page.driver().presence_checks("Advanced Mapping is enabled"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_advanced_mapping_twice_toggles_once() {
        let page = page_with(with_advanced_mapping("slds-hide"));

        page.enable_advanced_mapping_if_not_enabled().await.unwrap();
        page.enable_advanced_mapping_if_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_advanced_mapping_default_state() {
        let page = page_with(with_advanced_mapping("slds-hide foo"));
        assert_ok!(page.verify_advanced_mapping_is_not_enabled().await);

        let page = page_with(with_advanced_mapping("foo"));
        let err = assert_err!(page.verify_advanced_mapping_is_not_enabled().await);
        assert!(err.is_state_drift());
        assert_eq!(page.driver().click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gift_entry_already_checked_needs_no_clicks() {
        let driver = with_advanced_mapping("foo");
        with_gift_entry(&driver, Some("true"));
        let page = page_with(driver);

        page.enable_gift_entry_if_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gift_entry_unchecked_or_missing_attribute_clicks_once() {
        for checked in [Some("false"), None] {
            let driver = with_advanced_mapping("foo");
            with_gift_entry(&driver, checked);
            let page = page_with(driver);

            page.enable_gift_entry_if_not_enabled().await.unwrap();

            let driver = page.driver();
            assert_eq!(driver.click_count(), 1);
            assert_eq!(driver.presence_checks("Gift Entry Enabled"), 1);
            assert_eq!(
                driver.current_frame(),
                FrameContext::Frame(FRAME.to_string())
            );

            page.enable_gift_entry_if_not_enabled().await.unwrap();
            assert_eq!(page.driver().click_count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gift_entry_enables_advanced_mapping_first() {
        let driver = with_advanced_mapping("slds-hide");
        with_gift_entry(&driver, Some("false"));
        let page = page_with(driver);

        page.enable_gift_entry_if_not_enabled().await.unwrap();

        let advanced = sel("npsp_settings.checkbox", &["Advanced Mapping"]);
        let gift = sel("npsp_settings.checkbox", &["Gift Entry"]);
        let clicks: Vec<_> = page
            .driver()
            .calls()
            .into_iter()
            .filter(DriverCall::is_click)
            .collect();
        assert_eq!(clicks, vec![DriverCall::Click(advanced), DriverCall::Click(gift)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preenabled_gift_entry_is_switched_off() {
        let driver = settings_driver();
        with_gift_entry(&driver, Some("true"));
        driver.page().add_text("Gift Entry Enabled");
        let page = page_with(driver);

        page.verify_gift_entry_is_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 1);
        assert_eq!(page.driver().presence_checks("Gift Entry Disabled"), 1);
        assert_eq!(page.feature_state(Feature::GiftEntry).await.unwrap(), FeatureState::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_gift_entry_passes_verification() {
        let driver = settings_driver();
        with_gift_entry(&driver, None);
        let page = page_with(driver);

        page.verify_gift_entry_is_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_customizable_rollups_enable_and_short_circuit() {
        let driver = settings_driver();
        let probe = sel("id", &["navigateCRLPs"]);
        toggled_on_click(&driver, "Customizable Rollups", move |page| {
            page.add_element(&probe, MockElement::new())
        });
        let page = page_with(driver);

        page.enable_customizable_rollups_if_not_enabled().await.unwrap();
        page.enable_customizable_rollups_if_not_enabled().await.unwrap();

        assert_eq!(page.driver().click_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_customizable_rollups_wait_is_bounded() {
        let driver = settings_driver();
        toggled_on_click(&driver, "Customizable Rollups", |_| {});
        let page = page_with(driver);
        let start = Instant::now();

        let err = page.enable_customizable_rollups_if_not_enabled().await.unwrap_err();

        assert!(matches!(err, PageError::Timeout(_)));
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_crlp_returns_computed_value() {
        let driver = settings_driver();
        let page = page_with(driver);
        assert!(!page.check_crlp_not_enabled_by_default().await.unwrap());

        add(
            page.driver(),
            "id",
            &["navigateCRLPs"],
            MockElement::new().with_attribute("value", "Configure Customizable Rollups"),
        );
        assert!(page.check_crlp_not_enabled_by_default().await.unwrap());

        page.driver()
            .page()
            .set_attribute(&sel("id", &["navigateCRLPs"]), "value", "Enable Rollups");
        assert!(!page.check_crlp_not_enabled_by_default().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rd2_without_upgrade_link() {
        let page = page_with(settings_driver());
        assert!(!page.check_rd2_is_enabled().await.unwrap());
        assert_eq!(page.driver().click_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rd2_upgrade_link_then_installed_badge() {
        let driver = settings_driver();
        driver.page().add_link("Upgrade to Enhanced Recurring Donations");
        let installed = sel("erd.rd2_installed", &[]);
        driver.on_click("Upgrade to Enhanced Recurring Donations", move |page| {
            page.add_element(&installed, MockElement::new())
        });
        let page = page_with(driver);
        let start = Instant::now();

        assert!(page.check_rd2_is_enabled().await.unwrap());
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert!(page.check_metadeploy_exists().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rd2_upgrade_link_without_install() {
        let driver = settings_driver();
        driver.page().add_link("Upgrade to Enhanced Recurring Donations");
        let page = page_with(driver);

        assert!(!page.check_rd2_is_enabled().await.unwrap());
        assert_eq!(page.driver().click_count(), 1);
    }
}

mod failing_screenshots {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toggle_error_survives_screenshot_failure() {
        let driver = settings_driver();
        add(&driver, "npsp_settings.checkbox", &["Gift Entry"], MockElement::new().disabled());
        driver.fail_screenshots(true);
        let page = page_with(driver);

        let err = page.click_toggle_button("Gift Entry").await.unwrap_err();

        assert!(matches!(err, PageError::Timeout(ref m) if m == "Checkbox could not be found on the page"));
        assert_eq!(page.driver().screenshot_count(), 1);
        assert_eq!(page.screenshots().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_menu_error_survives_screenshot_failure() {
        let driver = settings_driver();
        driver.fail_screenshots(true);
        let page = page_with(driver);

        let err = page.open_main_menu("Batch Gift Entry").await.unwrap_err();

        assert_eq!(err.to_string(), "Batch Gift Entry link was not found on the page");
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_menu_success_survives_screenshot_failure() {
        let driver = settings_driver();
        driver.page().add_link("System Tools");
        add(&driver, "npsp_settings.main_menu", &["System Tools"], MockElement::new());
        driver.fail_screenshots(true);
        let page = page_with(driver);

        assert_ok!(page.open_main_menu("System Tools").await);
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_sub_link_still_captures() {
        let page = page_with(settings_driver());

        let err = page.open_sub_link("Opportunity Names").await.unwrap_err();

        assert_eq!(err.to_string(), "Opportunity Names link was not found on the page");
        assert_eq!(page.driver().screenshot_count(), 1);
        assert_eq!(page.driver().click_count(), 0);
        assert_eq!(page.screenshots().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_link_error_survives_screenshot_failure() {
        let driver = settings_driver();
        driver.fail_screenshots(true);
        let page = page_with(driver);

        let err = page.open_sub_link("Opportunity Names").await.unwrap_err();

        assert!(matches!(err, PageError::Timeout(_)));
        assert_eq!(page.driver().screenshot_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_timeout_survives_screenshot_failure() {
        let driver = settings_driver();
        driver.fail_screenshots(true);
        let page = page_with(driver);

        let err = page.wait_for_message("Gift Entry Enabled").await.unwrap_err();

        assert_eq!(err.to_string(), "Timed out waiting for Gift Entry Enabled to display");
        assert_eq!(page.driver().presence_checks("Gift Entry Enabled"), 13);
    }
}
