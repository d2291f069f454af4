use deferred_printf::{defer_printf, printf, Arg, ArenaError, DeferredPrintf, RecordArena, RecordRef};

/// Formats every record of `arena`, in iteration order.
fn render_all(arena: &RecordArena<'_, 64>) -> Vec<String> {
    arena
        .iter()
        .map(|record| {
            let mut line = String::new();
            let code = record.replay(&mut |f, a| printf::vsprintf(&mut line, f, a));
            assert!(code >= 0, "record {:?} failed to format", record);
            line
        })
        .collect()
}

fn collect_lines<const CAP: usize>(logger: &DeferredPrintf<'_, CAP>) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let summary = logger.replay_all_to(&mut lines, |lines, format, args| match printf::format(format, args) {
        Ok(line) => {
            let len = line.len() as i32;
            lines.push(line);
            len
        }
        Err(_) => -1,
    });
    assert!(summary.is_clean(), "unexpected failures: {:?}", summary.failures);
    lines
}

#[test]
fn test_basic_logging() {
    let mut logger = DeferredPrintf::<1024>::new();

    defer_printf!(logger, "Hello %d %d", 1, 2).unwrap();
    defer_printf!(logger, "Test %s", "string").unwrap();

    assert_eq!(collect_lines(&logger), ["Hello 1 2", "Test string"]);
}

#[test]
fn test_logger_capacity() {
    let mut arena = RecordArena::<64>::new();

    defer_printf!(arena, "Entry %d", 1).unwrap();
    let used = arena.bytes_used();
    assert!(used <= 32, "a one-int record should fit twice in 64 bytes, took {}", used);
    assert_eq!(arena.remaining(), 64 - used);
    defer_printf!(arena, "Entry %d", 2).unwrap();

    let err = defer_printf!(arena, "Large %s %s %s %f", "a", "b", "c", 1.0).unwrap_err();
    assert!(matches!(err, ArenaError::CapacityExceeded { capacity: 64, .. }));

    assert_eq!(arena.len(), 2);
    assert_eq!(render_all(&arena), ["Entry 1", "Entry 2"]);
}

#[test]
fn test_fill_until_capacity_exceeded() {
    let mut arena = RecordArena::<64>::new();
    let mut stored = 0;
    loop {
        match defer_printf!(arena, "n=%u", stored as u8) {
            Ok(()) => stored += 1,
            Err(ArenaError::CapacityExceeded { requested, available, .. }) => {
                assert!(requested > available);
                break;
            }
        }
    }
    assert!(stored > 0);
    assert!(arena.bytes_used() <= arena.capacity());

    let expected: Vec<String> = (0..stored).map(|i| format!("n={i}")).collect();
    assert_eq!(render_all(&arena), expected);
}

#[test]
fn test_thousand_sequential_entries() {
    let mut logger = DeferredPrintf::<{ 128 * 1024 }>::new();
    for i in 0..1000 {
        defer_printf!(logger, "Log entry %d", i).unwrap();
    }
    assert_eq!(logger.len(), 1000);

    let lines = collect_lines(&logger);
    assert_eq!(lines.len(), 1000);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &format!("Log entry {i}"));
    }
}

#[test]
fn test_replay_twice_is_identical() {
    let mut logger = DeferredPrintf::<1024>::new();
    defer_printf!(logger, "once %s %d", "only", 1).unwrap();

    let first = collect_lines(&logger);
    let second = collect_lines(&logger);
    assert_eq!(first, ["once only 1"]);
    assert_eq!(first, second);
}

#[test]
fn test_begin_end_passes_are_independent() {
    let mut arena = RecordArena::<1024>::new();
    defer_printf!(arena, "a %d", 1).unwrap();
    defer_printf!(arena, "b %s", "x").unwrap();
    defer_printf!(arena, "c").unwrap();

    let walk = |arena: &RecordArena<'_, 1024>| {
        let mut formats = Vec::new();
        let mut cursor = arena.begin();
        let end = arena.end();
        while cursor != end {
            formats.push(cursor.record().unwrap().format().to_string());
            cursor.advance();
        }
        formats
    };

    let mut outer = arena.begin();
    let first = walk(&arena);
    outer.advance();
    let second = walk(&arena);
    assert_eq!(first, ["a %d", "b %s", "c"]);
    assert_eq!(first, second);
    assert_eq!(outer.record().unwrap().format(), "b %s");
}

#[test]
fn test_mixed_signatures_keep_their_sizes() {
    let mut arena = RecordArena::<4096>::new();
    defer_printf!(arena, "%d", 1i32).unwrap();
    defer_printf!(arena, "%d", 1i64).unwrap();
    defer_printf!(arena, "%c %s %f %p", 'x', String::from("owned"), 2.5f32, deferred_printf::Ptr::null()).unwrap();
    defer_printf!(arena, "none").unwrap();
    defer_printf!(arena, "%u %u %u %u %u %u", 1u8, 2u16, 3u32, 4u64, 5usize, 6u8).unwrap();

    let sizes: Vec<usize> = arena.iter().map(|r| r.byte_size()).collect();
    assert_eq!(sizes.iter().sum::<usize>(), arena.bytes_used());
    assert!(sizes[2] > sizes[0]);

    let arities: Vec<usize> = arena.iter().map(|r| r.arity()).collect();
    assert_eq!(arities, [1, 1, 4, 0, 6]);

    let mut lines = Vec::new();
    for record in &arena {
        let mut line = String::new();
        record.replay(&mut |f, a| printf::vsprintf(&mut line, f, a));
        lines.push(line);
    }
    assert_eq!(lines, ["1", "1", "x owned 2.500000 (nil)", "none", "1 2 3 4 5 6"]);
}

#[test]
fn test_i32_and_i64_are_distinct_records() {
    let mut arena = RecordArena::<1024>::new();
    defer_printf!(arena, "%d %d %d %d", 1i32, 2i32, 3i32, 4i32).unwrap();
    defer_printf!(arena, "%d %d %d %d", 1i64, 2i64, 3i64, 4i64).unwrap();

    let records: Vec<RecordRef<'_, '_>> = arena.iter().collect();
    assert!(records[1].byte_size() > records[0].byte_size());

    let mut seen = Vec::new();
    for record in records {
        record.replay(&mut |_, args: &[Arg<'_>]| {
            seen.push(args.to_vec().len());
            0
        });
    }
    assert_eq!(seen, [4, 4]);
}

#[test]
fn test_format_reference_is_borrowed() {
    let format = String::from("borrowed %s");
    let value = String::from("value");
    let mut logger: DeferredPrintf<'_, 256> = DeferredPrintf::new();
    logger.record(format.as_str(), (value.as_str(),)).unwrap();

    let record = logger.arena().iter().next().unwrap();
    assert!(std::ptr::eq(record.format(), format.as_str()));
    assert_eq!(collect_lines(&logger), ["borrowed value"]);
}
