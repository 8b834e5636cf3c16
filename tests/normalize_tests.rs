//! Integration tests for path expression normalization.

use jsonhand::jsonpath::normalize;

#[test]
fn test_root_alone() {
    assert_eq!(normalize("$"), "$");
}

#[test]
fn test_dot_and_bracket_forms_agree() {
    let dotted = normalize("$.data.months.url");
    assert_eq!(dotted, "$;data;months;url");
    assert_eq!(normalize("$['data']['months']['url']"), dotted);
    assert_eq!(normalize("$.data['months'].url"), dotted);
}

#[test]
fn test_indices_and_slices() {
    assert_eq!(normalize("$.data[0]"), "$;data;0");
    assert_eq!(normalize("$.data[1:2]"), "$;data;1:2");
    assert_eq!(normalize("$.data[-1:]"), "$;data;-1:");
    assert_eq!(normalize("$.data[0:4:2].year"), "$;data;0:4:2;year");
}

#[test]
fn test_recursive_descent_marker() {
    assert_eq!(normalize("$..month"), "$;..;month");
    assert_eq!(normalize("$.data..year"), "$;data;..;year");
    assert_eq!(normalize("$..data..count"), "$;..;data;..;count");
}

#[test]
fn test_filter_keeps_its_text() {
    assert_eq!(
        normalize("$.data[?(@.years==2018)]"),
        "$;data;?(@.years==2018)"
    );
    assert_eq!(
        normalize("$.data[?(@.months.length > 3 && @.count < 30)].year"),
        "$;data;?(@.months.length > 3 && @.count < 30);year"
    );
}

#[test]
fn test_computed_index_keeps_its_text() {
    assert_eq!(
        normalize("$.data[(@.length-1)]"),
        "$;data;(@.length-1)"
    );
}

#[test]
fn test_several_expressions_in_one_query() {
    assert_eq!(
        normalize("$.data[?(@.year)].months[(@.length-1)].url"),
        "$;data;?(@.year);months;(@.length-1);url"
    );
}

#[test]
fn test_quoted_union() {
    assert_eq!(normalize("$['code','message']"), "$;code','message");
}

#[test]
fn test_normalizing_twice_changes_nothing() {
    for expr in [
        "$..month",
        "$.data[*].year",
        "$.data[?(@.years==2018)].months[0].url",
        "$.data[(@.length-1)]",
        "$.data[-1:]",
    ] {
        let once = normalize(expr);
        assert_eq!(normalize(&once), once);
    }
}
