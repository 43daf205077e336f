use sci_case_scraper::{acquire_session, CaseFlow, Config, FetchCtx, FetchOutcome, JsExecutor};

#[tokio::test]
#[ignore] // 默认忽略，需要可用的浏览器：cargo test -- --ignored
async fn test_browser_session() {
    // 初始化日志
    sci_case_scraper::logger::init();

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器会话获取
    let result = acquire_session(&config).await;

    assert!(result.is_ok(), "应该能够获取浏览器会话");
}

#[tokio::test]
#[ignore] // 需要浏览器、网络与可用的 LLM 端点
async fn test_single_diary_fetch() {
    // 初始化日志
    sci_case_scraper::logger::init();

    // 加载配置
    let config = Config::from_env();

    // 获取浏览器会话
    let (_browser, page) = acquire_session(&config).await.expect("获取浏览器会话失败");
    let executor = JsExecutor::new(page);

    // 创建查询流程
    let flow = CaseFlow::new(&config).expect("创建查询流程失败");
    let ctx = FetchCtx::new(config.start_diary_no, config.year);

    // 执行一次完整查询
    let outcome = flow.run(&executor, &ctx).await.expect("查询执行失败");

    match outcome {
        FetchOutcome::Found(record) => {
            println!("命中案件: {}", record.case_no);
            assert_eq!(record.diary_no, config.start_diary_no);
        }
        FetchOutcome::NotFound => {
            println!("Diary No {} 无记录", config.start_diary_no);
        }
    }
}
