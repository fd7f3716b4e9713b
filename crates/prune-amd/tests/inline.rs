// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Inlining whole module trees built on disk.

use prune_amd::{AmdError, Config, inline_dependencies};
use prune_syntax::codegen::{GeneratorOptions, generate};
use std::fs;
use std::path::Path;

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn try_bundle(root: &Path, entry: &str, config: Config) -> Result<String, AmdError> {
    let file = root.join(entry);
    let source = fs::read_to_string(&file).unwrap();
    let program = prune_syntax::parse(&source, Some(entry))?;
    let combined = inline_dependencies(&file, program, config)?;
    Ok(generate(&combined, &GeneratorOptions::compact()))
}

fn bundle(root: &Path, config: Config) -> String {
    try_bundle(root, "main.js", config).unwrap()
}

fn offset(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, code))
}

#[test]
fn test_dependencies_come_first() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a'], function (a) {});");
    write(dir.path(), "a.js", "define(['b'], function (b) { return b; });");
    write(dir.path(), "b.js", "define(function () { return 1; });");

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    assert_eq!(
        code,
        "define(\"b\",function(){return 1;});\
         define(\"a\",[\"b\"],function(b){return b;});\
         require([\"a\"],function(a){});"
    );
}

#[test]
fn test_cycle_is_one_cluster() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a'], function (a) {});");
    write(dir.path(), "a.js", "define(['b'], function (b) { return 'a'; });");
    write(dir.path(), "b.js", "define(['a'], function (a) { return 'b'; });");

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    assert_eq!(code.matches("define(\"a\"").count(), 1);
    assert_eq!(code.matches("define(\"b\"").count(), 1);
    assert!(offset(&code, "define(\"b\"") < offset(&code, "define(\"a\""));
    assert!(offset(&code, "define(\"a\"") < offset(&code, "require("));
}

#[test]
fn test_shared_dependency_included_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a', 'b'], function () {});");
    write(dir.path(), "a.js", "define(['./shared'], function () {});");
    write(dir.path(), "b.js", "define(['shared'], function () {});");
    write(dir.path(), "shared.js", "define(function () { return 'shared'; });");

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    assert_eq!(code.matches("return'shared'").count() + code.matches("return 'shared'").count(), 1);
    assert!(offset(&code, "define(\"shared\"") < offset(&code, "define(\"a\""));
}

#[test]
fn test_absolute_and_missing_references_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.js",
        "require(['//localhost/x', 'http://cdn/y.js', 'nope', 'a'], function () {});",
    );
    write(dir.path(), "a.js", "define(function () {});");

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    assert_eq!(
        code,
        "define(\"a\",function(){});require(['//localhost/x','http://cdn/y.js','nope',\"a\"],function(){});"
    );
}

#[test]
fn test_rename_rewrites_every_reference() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['lib/old', 'user'], function () {});");
    write(dir.path(), "lib/old.js", "define('lib/new', function () { return 1; });");
    write(dir.path(), "user.js", "define(['lib/old'], function (dep) { return dep; });");

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    assert!(!code.contains("lib/old"), "{}", code);
    assert_eq!(code.matches("define('lib/new'").count(), 1);
    assert!(code.contains("define(\"user\",[\"lib/new\"]"));
    assert!(code.contains("require([\"lib/new\",\"user\"]"));
}

#[test]
fn test_named_siblings_become_aliases() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['bundle', 'second'], function () {});");
    write(
        dir.path(),
        "bundle.js",
        "define('first', function () { return 1; }); define('bundle', function () { return 2; });",
    );

    let code = bundle(dir.path(), Config::with_root(dir.path()));
    // 'second' is not a file and is not named by any define
    assert!(code.contains("'second'"));
    assert!(code.contains("require([\"bundle\","));
    assert_eq!(code.matches("define('first'").count(), 1);
}

#[test]
fn test_plugins_and_path_aliases() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.js",
        "require(['text!deep/template.html', 'js!deep/plain.js', 'app/aliased'], function () {});",
    );
    write(dir.path(), "deep/template.html", "<b>{{contents}}</b>");
    write(dir.path(), "deep/plain.js", "var mytestvar = 'plain'");
    write(dir.path(), "deep/deeper/aliased.js", "define(function () {});");

    let config = Config::with_root(dir.path()).path("app", "deep/deeper");
    let code = bundle(dir.path(), config);

    assert!(code.contains("define(\"deep/template.html\",function(){return unescape('%3Cb%3E%7B%7Bcontents%7D%7D%3C/b%3E');});"));
    assert!(offset(&code, "var mytestvar") < offset(&code, "define(\"deep/plain.js\""));
    assert!(code.contains("define(\"deep/deeper/aliased\",function(){});"));
    assert!(code.contains(
        "require([\"deep/template.html\",\"deep/plain.js\",\"deep/deeper/aliased\"]"
    ));
}

#[test]
fn test_base_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "js/main.js", "require(['lib/a'], function () {});");
    write(dir.path(), "js/lib/a.js", "define(['./b'], function () {});");
    write(dir.path(), "js/lib/b.js", "define(function () {});");

    let config = Config::with_root(dir.path()).base_path("js");
    let code = try_bundle(dir.path(), "js/main.js", config).unwrap();
    assert_eq!(
        code,
        "define(\"lib/b\",function(){});define(\"lib/a\",[\"lib/b\"],function(){});require([\"lib/a\"],function(){});"
    );
}

#[test]
fn test_parse_error_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a']);");
    write(dir.path(), "a.js", "define(function () { return ; ) });");

    let err = try_bundle(dir.path(), "main.js", Config::with_root(dir.path())).unwrap_err();
    match err {
        AmdError::Parse(error) => {
            assert_eq!(error.location().source.as_deref(), Some("a.js"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_stray_anonymous_define_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a']);");
    write(dir.path(), "a.js", "define(function () {});\ndefine(function () {});");

    let err = try_bundle(dir.path(), "main.js", Config::with_root(dir.path())).unwrap_err();
    assert!(matches!(err, AmdError::AnonymousDefine { ref module, .. } if module == "a"));
}

#[test]
fn test_sibling_define_shadowing_a_module_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a', 'b'], function () {});");
    write(dir.path(), "a.js", "define(function () { return 'real a'; });");
    write(
        dir.path(),
        "b.js",
        "define(function () {}); define('a', function () { return 'fake a'; });",
    );

    let err = try_bundle(dir.path(), "main.js", Config::with_root(dir.path())).unwrap_err();
    match err {
        AmdError::NameCollision { name, path } => {
            assert_eq!(name, "a");
            assert!(path.ends_with("a.js"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_rename_shadowing_a_module_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "main.js", "require(['a', 'x'], function () {});");
    write(dir.path(), "a.js", "define(function () { return 'real a'; });");
    write(dir.path(), "x.js", "define('a', function () { return 'fake a'; });");

    let err = try_bundle(dir.path(), "main.js", Config::with_root(dir.path())).unwrap_err();
    assert!(matches!(err, AmdError::NameCollision { ref name, .. } if name == "a"));
}

const MAIN: &str = r#";(function() {
	define('namedmodule', function(){
		return "Named module contents"
	})

	define('deep/namedmodule', function(){
		return "Deep named module contents"
	})

	if (false) {
		var we_may_need_this
		we_may_need_this = require('deep/deeper/dynamic')
		we_may_need_this = require('deep/deeper/this_does_not_exist') // declared, never loaded
	}

	var prefix = 'deep/deeper/'
	var resource = 'dynamic'
	require([
		'deep/main'
		, 'deep/namedmodule'
		, '//localhost/prunejs/test/absolute'
		, 'text!deep/template.html'
		, 'deep/deeper/main'
		, prefix + resource
		, 'js!deep/plain.js'
		, 'css!deep/style.css'
		, 'app/pathaliased'
	]
	, function(main, namedmodule, absolute, template, superdeep, dynamic, plain, css, aliased){
		var r = document.getElementById('results')
		r.innerHTML = template.replace('{{contents}}', main) +
			template.replace('{{contents}}', typeof mytestvar !== 'undefined' ? mytestvar : "broken")
	})
}).call( this );
"#;

const DEEPER_MAIN: &str = r#";(function() {

	function a(){
	    require(
	    	['../relative']
	    	, function(relative){
	    		console.log('global require resolves against the root')
	    	}
	    )
	}

	define(['../relative','require'], function(relative, require){
		a()
		var relative2 = require('../relative')
		return relative + ' + ' + relative2
	})
})();
"#;

#[test]
fn test_end_to_end_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let js = dir.path().join("js");
    write(&js, "main.js", MAIN);
    write(&js, "deep/main.js", "define(function(){ return 'Deep main contents' })");
    write(&js, "deep/template.html", "<div>{{contents}}</div>\n");
    write(&js, "deep/deeper/main.js", DEEPER_MAIN);
    write(&js, "deep/relative.js", "define(function(){ return 'Relative contents' })");
    write(&js, "deep/deeper/dynamic.js", "define(function(){ return 'Dynamic contents' })");
    write(&js, "deep/plain.js", "var mytestvar = 'Plain js contents'\n");
    write(&js, "deep/style.css", "#results { color: green; }\n");
    write(&js, "deep/deeper/pathaliased.js", "define(function(){ return 'Aliased contents' })");

    let config = Config::with_root(&js).path("app", "deep/deeper");
    let code = bundle(&js, config);

    // the combined output is itself a program
    prune_syntax::parse(&code, None).unwrap();

    for name in [
        "deep/deeper/dynamic",
        "deep/main",
        "deep/template.html",
        "deep/relative",
        "deep/deeper/main",
        "deep/plain.js",
        "deep/style.css",
        "deep/deeper/pathaliased",
    ] {
        let define = format!("define(\"{}\",", name);
        assert_eq!(code.matches(&define).count(), 1, "{} in {}", define, code);
    }

    // dependencies ahead of dependents, the entry file last
    assert!(offset(&code, "define(\"deep/relative\",") < offset(&code, "define(\"deep/deeper/main\","));
    assert!(offset(&code, "var mytestvar") < offset(&code, "define(\"deep/plain.js\","));
    assert!(offset(&code, "define(\"deep/deeper/pathaliased\",") < offset(&code, "define('namedmodule'"));
    assert!(offset(&code, "define('namedmodule'") < offset(&code, "define('deep/namedmodule'"));

    // references now name the modules they resolved to
    assert!(code.contains(
        "require([\"deep/main\",\"deep/namedmodule\",'//localhost/prunejs/test/absolute',\"deep/template.html\",\"deep/deeper/main\",prefix+resource,\"deep/plain.js\",\"deep/style.css\",\"deep/deeper/pathaliased\"]"
    ));
    assert!(code.contains("define(\"deep/deeper/main\",[\"deep/relative\",'require']"));
    assert!(code.contains("require(\"deep/relative\")"));
    assert!(code.contains("require(['../relative']"));
}
