pub mod problem_tests;
